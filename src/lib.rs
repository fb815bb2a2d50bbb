pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logger;
pub mod model;
pub mod service;

mod macros;

pub mod prelude {
    pub use derive_new::new;
    pub use serde::{de::DeserializeOwned, Deserialize, Serialize};
    pub use snafu::{ensure, Location, OptionExt, ResultExt, Snafu};

    pub use crate::database::{Database, DatabaseQueryError, Record, Sql, Table};
    pub use crate::model::{now, Timestamp};
    pub use crate::{define_relation, define_table, Located};
}

pub trait Located {
    fn location(&self) -> snafu::Location;
}
