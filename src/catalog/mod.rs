//! Catalog access for privilege introspection.
//!
//! The manifest pipeline only ever needs to run `SHOW ...` statements and read
//! the result rows by column name, so the seam is a single [`Catalog::query`]
//! method. [`SnowflakeCatalog`] talks to a live account; tests provide their
//! own scripted implementations.

mod account;
mod keypair;
mod snowflake;

use std::collections::HashMap;

use thiserror::Error;

pub use account::{parse_account_from_url, resolve_account};
pub use keypair::{read_private_key, KeyPairCredentials};
pub use snowflake::{Authenticator, ConnectionConfig, Credentials, SnowflakeCatalog};

/// Errors raised by a catalog while opening a session or running a statement
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to connect to Snowflake: {message}")]
    Login { message: String },

    #[error("Query execution failed: {message}")]
    Query { message: String },

    #[error("Malformed response from Snowflake: {message}")]
    MalformedResponse { message: String },

    #[error("Catalog session is closed")]
    NotConnected,
}

/// One result row, keyed by lowercase column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: HashMap<String, Option<String>>,
}

impl Row {
    /// Build a row from `(column, value)` pairs. Column names are lowercased.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let columns = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_lowercase(), v.map(Into::into)))
            .collect();
        Self { columns }
    }

    /// Value of `column`, or `None` when the column is missing or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .get(&column.to_lowercase())
            .and_then(|v| v.as_deref())
    }
}

/// A source of introspection results.
pub trait Catalog {
    /// Run one statement and return every row of its result set.
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, CatalogError>;
}

impl<C: Catalog + ?Sized> Catalog for &mut C {
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, CatalogError> {
        (**self).query(sql)
    }
}
