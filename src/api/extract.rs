use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use snafu::OptionExt;

use super::state::App;
use crate::database::Record;
use crate::model::{Principal, User};
use crate::service::error::UnauthenticatedSnafu;
use crate::service::ServiceError;

/// Set by the authentication gateway in front of the service.
pub const USER_HEADER: &str = "x-user-id";

/// The caller, if the request carries a user id.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Principal>);

impl Caller {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

/// The caller of a request that requires one.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl FromRequestParts<App> for Caller {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, app: &App) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(USER_HEADER) else {
            return Ok(Caller(None));
        };

        let key = header
            .to_str()
            .ok()
            .filter(|key| !key.is_empty())
            .context(UnauthenticatedSnafu)?;
        let principal = app.principal(&Record::<User>::new(key)).await?;

        Ok(Caller(Some(principal)))
    }
}

#[async_trait]
impl FromRequestParts<App> for Authenticated {
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, app: &App) -> Result<Self, Self::Rejection> {
        let Caller(principal) = Caller::from_request_parts(parts, app).await?;
        let principal = principal.context(UnauthenticatedSnafu)?;

        Ok(Authenticated(principal))
    }
}
