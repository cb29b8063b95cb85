//! share-manifest: declarative application manifests from Snowflake data shares
//!
//! This library introspects the grants of a secure data share, follows the
//! database roles granted to it, and renders the shared databases, schemas,
//! tables and views as a `manifest_version: 2` YAML document.

pub mod catalog;
pub mod error;
pub mod identifier;
pub mod manifest;
pub mod yaml;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use catalog::{
    read_private_key, resolve_account, Authenticator, Catalog, ConnectionConfig, Credentials,
    KeyPairCredentials, SnowflakeCatalog,
};
pub use error::ManifestError;
use manifest::ShareManifestGenerator;
use yaml::YamlFormatter;

/// Options for generating a manifest
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Account identifier or full account URL
    pub account: Option<String>,
    /// Account host name; takes precedence over `account`
    pub host: Option<String>,
    pub user: String,
    pub password: Option<String>,
    pub private_key_path: Option<PathBuf>,
    pub private_key_passphrase: Option<String>,
    /// `snowflake` or `snowflake_jwt`
    pub authenticator: String,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
    /// Name of the data share to describe
    pub share: String,
    /// Output path for the manifest; standard output when `None`
    pub output_path: Option<PathBuf>,
    pub indent: usize,
    pub sort_keys: bool,
    pub verbose: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            account: None,
            host: None,
            user: String::new(),
            password: None,
            private_key_path: None,
            private_key_passphrase: None,
            authenticator: "snowflake".to_string(),
            warehouse: None,
            database: None,
            schema: None,
            role: None,
            share: String::new(),
            output_path: None,
            indent: yaml::DEFAULT_INDENT,
            sort_keys: true,
            verbose: false,
        }
    }
}

impl GenerateOptions {
    pub fn formatter(&self) -> YamlFormatter {
        YamlFormatter::new(self.indent, self.sort_keys)
    }
}

/// Turn CLI options into a session configuration.
///
/// Checks credentials before anything else so a run without a password or
/// key fails without touching the network. A password wins over a key.
pub fn connection_config(options: &GenerateOptions) -> Result<ConnectionConfig, ManifestError> {
    if options.password.is_none() && options.private_key_path.is_none() {
        return Err(ManifestError::MissingCredentials);
    }

    let account = resolve_account(options.account.as_deref(), options.host.as_deref())?;
    let authenticator: Authenticator = options.authenticator.parse()?;

    let credentials = match (&options.password, &options.private_key_path) {
        (Some(password), _) => Credentials::Password(password.clone()),
        (None, Some(path)) => {
            let pem = read_private_key(path)?;
            let key_pair =
                KeyPairCredentials::from_pem(&pem, options.private_key_passphrase.as_deref())?;
            Credentials::KeyPair(key_pair)
        }
        (None, None) => return Err(ManifestError::MissingCredentials),
    };

    Ok(ConnectionConfig {
        account,
        user: options.user.clone(),
        credentials,
        authenticator,
        warehouse: options.warehouse.clone(),
        database: options.database.clone(),
        schema: options.schema.clone(),
        role: options.role.clone(),
    })
}

/// Generate the manifest against `catalog` and write it out.
///
/// Writes to `options.output_path` when set, otherwise to standard output.
pub fn write_manifest<C: Catalog>(catalog: C, options: &GenerateOptions) -> Result<()> {
    // Step 1: Collect, resolve and assemble
    let mut generator = ShareManifestGenerator::new(catalog);
    let manifest = generator
        .analyze_share(&options.share)
        .with_context(|| format!("Failed to analyze share {}", options.share))?;

    // Step 2: Render
    let formatter = options.formatter();
    match &options.output_path {
        Some(path) => {
            formatter.save_to_file(&manifest, path)?;
            info!(
                "Manifest generation complete. Results saved to: {}",
                path.display()
            );
        }
        None => formatter.write_to(&manifest, std::io::stdout().lock())?,
    }

    Ok(())
}

/// Connect to Snowflake and generate the manifest described by `options`.
pub fn generate_manifest(options: &GenerateOptions) -> Result<()> {
    let config = connection_config(options)?;

    info!("Establishing connection to Snowflake...");
    let mut catalog = SnowflakeCatalog::new(config).context("Failed to set up Snowflake client")?;
    // Log in up front: the introspection queries treat failures as "no
    // grants", which would turn a bad login into an empty manifest.
    catalog.connect()?;

    info!("Generating manifest for share: {}", options.share);
    let result = write_manifest(&mut catalog, options);

    if let Err(e) = catalog.close() {
        warn!("Failed to close Snowflake session: {}", e);
    }

    result
}
