use serde::de::DeserializeOwned;
use serde::Deserialize;
use snafu::{OptionExt as _, ResultExt as _};
use surrealdb::opt::QueryResult;

use super::*;

/// An extension trait that allows you to execute raw SQL queries. Parameters can be bound using the [Bindings::bind] method which takes any serializable data structure.
///
/// # Example
/// ```ignore
/// let enrollments: Vec<Enrollment> = database.sql("SELECT * FROM enrollments WHERE student = $student")
///     .bind(("student", &student))
///     .fetch_first()
///     .await?;
/// ```
pub trait Sql {
    fn sql(&self, query: &str) -> Bindings<'_>;
}

impl Sql for Database {
    fn sql(&self, query: &str) -> Bindings<'_> {
        Bindings {
            query: self.database.query(query),
        }
    }
}

#[derive(Debug)]
pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, surrealdb::engine::any::Any>,
}

impl Bindings<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the query and return a [surrealdb::Response] which is SurrealDB's way to represent a list of statements returned from the database.
    pub async fn execute(self) -> Result<surrealdb::Response, DatabaseQueryError> {
        let response = self.query.await.context(MalformedQuerySnafu)?;
        tracing::trace!(?response, "executed query");
        Ok(response)
    }

    /// Execute the query and return the first result as a deserialized value.
    pub async fn fetch_first<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.execute().await?;
        let result = statements.take::<T>(0).context(DeserializeSnafu)?;
        Ok(result)
    }

    /// Like [Bindings::fetch_first] but fails when the statement produced nothing.
    pub async fn fetch_one<T: DeserializeOwned>(self) -> Result<T, DatabaseQueryError> {
        self.fetch_first::<Option<T>>()
            .await?
            .context(NoResultsSnafu)
    }
}

/// Row shape of a `SELECT count() ... GROUP ALL` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Count {
    pub count: u64,
}

impl Count {
    pub fn total(count: Option<Count>) -> u64 {
        count.map_or(0, |Count { count }| count)
    }
}
