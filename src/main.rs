use dotenvy::dotenv;
use snafu::ResultExt;
use tokio::net::TcpListener;

use lectern::api::{self, App};
use lectern::config::Config;
use lectern::database::Database;
use lectern::error::{ApplicationError, BindAddressSnafu, ConnectDatabaseSnafu, WebServerSnafu};
use lectern::logger;
use lectern::service::Service;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    let _guard = logger::init(&config)?;

    let database = Database::connect(&config.database)
        .await
        .context(ConnectDatabaseSnafu)?;
    let service = Service::with_retry(database, config.retry_policy());
    let router = api::router(App::new(service));

    let listener = TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu { address: config.host })?;
    tracing::info!(address = %config.host, "listening");

    axum::serve(listener, router).await.context(WebServerSnafu)
}
