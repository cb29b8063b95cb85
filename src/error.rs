//! Error types for share-manifest

use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors that can occur while generating a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Invalid {context}: {reason}")]
    InvalidIdentifier { context: String, reason: String },

    #[error("Either --account or --host must be provided")]
    MissingAccount,

    #[error("Must provide either --password or --private-key-path")]
    MissingCredentials,

    #[error("Unsupported authenticator: {name} (expected snowflake or snowflake_jwt)")]
    UnsupportedAuthenticator { name: String },

    #[error("Private key file not found: {path}")]
    PrivateKeyNotFound { path: PathBuf },

    #[error("Failed to read private key file: {path}")]
    PrivateKeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Private key file is empty: {path}")]
    PrivateKeyEmpty { path: PathBuf },

    #[error("Failed to decode private key: {message}")]
    PrivateKeyDecode { message: String },

    #[error("YAML serialization error: {message}")]
    Serialization { message: String },

    #[error("Failed to write manifest to {path}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<serde_yaml::Error> for ManifestError {
    fn from(err: serde_yaml::Error) -> Self {
        ManifestError::Serialization {
            message: err.to_string(),
        }
    }
}
