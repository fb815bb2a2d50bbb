use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snafu::{Location, ResultExt as _, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth;
use surrealdb::Surreal;
use url::Url;

/// Helper trait for executing arbitrary SurrealQL queries.
pub mod query;

/// Typed record ids.
pub mod record;

pub use query::{Bindings, Count, Sql};
pub use record::Record;
pub use surrealdb::sql::Thing;

use crate::Located;

const SCHEMA: &str = include_str!("../schema.surrealql");

const MEMORY_NAMESPACE: &str = "lectern";
const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseQueryError {
    #[snafu(display("failed to execute query: {source}"))]
    MalformedQuery {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to deserialize the query result: {source}"))]
    Deserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("expected exactly one result, but got none"))]
    NoResults {
        #[snafu(implicit)]
        location: Location,
    },
}

impl Located for DatabaseQueryError {
    fn location(&self) -> Location {
        match self {
            DatabaseQueryError::MalformedQuery { location, .. }
            | DatabaseQueryError::Deserialize { location, .. }
            | DatabaseQueryError::NoResults { location } => *location,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseConnectionError {
    #[snafu(display("cannot connect to the database `{url}`: {source}"))]
    Connect {
        url: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot sign in to the database as `{username}`: {source}"))]
    SignIn {
        username: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot select namespace `{namespace}` and database `{database}`: {source}"))]
    SelectDatabase {
        namespace: String,
        database: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("cannot apply the database schema: {source}"))]
    ApplySchema {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}

/// Represents a record that lives in a table of its own.
pub trait Table {
    /// Returns the ID of the record.
    fn id(&self) -> &Thing;

    /// Returns the name of the table associated with the record.
    fn table() -> &'static str;
}

impl<T: Table> Table for &T {
    fn id(&self) -> &Thing {
        (*self).id()
    }

    fn table() -> &'static str {
        T::table()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(rename = "surreal_url")]
    pub url: Url,
    #[serde(rename = "surreal_ns")]
    pub namespace: String,
    #[serde(rename = "surreal_db")]
    pub database: String,
    #[serde(rename = "surreal_user")]
    pub username: Option<String>,
    #[serde(rename = "surreal_pass")]
    pub password: Option<String>,
}

/// Represents a database wrapper.
///
/// Cloning is cheap, every clone talks to the same underlying connection.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    /// Connects to the configured endpoint, signs in when credentials are given and applies the schema.
    #[tracing::instrument(skip(config), fields(url = %config.url))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseConnectionError> {
        let url = config.url.as_str();
        let database = surrealdb::engine::any::connect(url)
            .await
            .context(ConnectSnafu { url })?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            database
                .signin(auth::Root { username, password })
                .await
                .context(SignInSnafu { username })?;
        }

        Self::setup(database, &config.namespace, &config.database).await
    }

    /// Opens a fresh in-memory database with the schema applied. Every call gets its own datastore.
    pub async fn memory() -> Result<Self, DatabaseConnectionError> {
        let database = surrealdb::engine::any::connect("mem://")
            .await
            .context(ConnectSnafu { url: "mem://" })?;

        Self::setup(database, MEMORY_NAMESPACE, MEMORY_DATABASE).await
    }

    async fn setup(
        database: Surreal<Any>,
        namespace: &str,
        name: &str,
    ) -> Result<Self, DatabaseConnectionError> {
        database
            .use_ns(namespace)
            .use_db(name)
            .await
            .context(SelectDatabaseSnafu { namespace, database: name })?;

        database
            .query(SCHEMA)
            .await
            .and_then(|response| response.check())
            .context(ApplySchemaSnafu)?;

        tracing::info!(namespace, database = name, "database is ready");
        Ok(Self { database })
    }

    /// Fetches a single record by its id.
    pub async fn get<T>(&self, id: &Record<T>) -> Result<Option<T>, DatabaseQueryError>
    where
        T: Table + DeserializeOwned,
    {
        self.sql("SELECT * FROM $id").bind(("id", id)).fetch_first().await
    }

    /// Creates `record` under its own id and returns the stored document.
    pub async fn insert<T>(&self, record: &T) -> Result<T, DatabaseQueryError>
    where
        T: Table + Serialize + DeserializeOwned,
    {
        self.sql("CREATE $id CONTENT $content RETURN AFTER")
            .bind(("id", record.id()))
            .bind(("content", record))
            .fetch_one()
            .await
    }
}

impl std::ops::Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.database
    }
}
