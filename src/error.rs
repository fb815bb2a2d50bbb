use std::net::SocketAddr;

use snafu::{Location, Snafu};

use crate::database::DatabaseConnectionError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ApplicationError {
    /// could not parse the configuration from the environment
    ConfigLoad {
        source: envy::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not connect to the database
    ConnectDatabase {
        source: DatabaseConnectionError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not serve the application
    WebServer {
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not bind to the given address, check if it's already in use
    BindAddress {
        address: SocketAddr,
        source: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// The log filter directive is invalid
    LogFilter {
        filter: String,
        source: tracing_subscriber::filter::ParseError,
        #[snafu(implicit)]
        location: Location,
    },

    /// Could not initialize the logger
    InitializeLogger {
        source: tracing::subscriber::SetGlobalDefaultError,
        #[snafu(implicit)]
        location: Location,
    },
}
