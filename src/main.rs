use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use share_manifest::{generate_manifest, GenerateOptions};

#[derive(Parser)]
#[command(name = "share-manifest")]
#[command(
    author,
    version,
    about = "Create a declarative application manifest from a secure data share",
    after_help = "Examples:
  share-manifest --account myaccount.region.cloud --user me --password secret --share MYSHARE
  share-manifest --host myaccount.region.cloud.snowflakecomputing.com --user me --private-key-path key.pem --share MYSHARE -o manifest.yml"
)]
struct Cli {
    /// Snowflake account identifier or full URL (e.g. https://myaccount.snowflakecomputing.com)
    #[arg(long, env = "SNOWFLAKE_ACCOUNT")]
    account: Option<String>,

    /// Snowflake host (e.g. myaccount.region.cloud.snowflakecomputing.com); preferred over --account
    #[arg(long, env = "SNOWFLAKE_HOST")]
    host: Option<String>,

    /// Snowflake username
    #[arg(long, env = "SNOWFLAKE_USER")]
    user: String,

    /// Password (password authentication)
    #[arg(long, env = "SNOWFLAKE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to a PEM private key (key-pair authentication)
    #[arg(long, env = "SNOWFLAKE_PRIVATE_KEY_PATH")]
    private_key_path: Option<PathBuf>,

    /// Passphrase for an encrypted private key
    #[arg(long, env = "SNOWFLAKE_PRIVATE_KEY_PASSPHRASE", hide_env_values = true)]
    private_key_passphrase: Option<String>,

    /// Authentication method (snowflake, snowflake_jwt)
    #[arg(long, env = "SNOWFLAKE_AUTHENTICATOR", default_value = "snowflake")]
    authenticator: String,

    /// Warehouse to use
    #[arg(long, env = "SNOWFLAKE_WAREHOUSE")]
    warehouse: Option<String>,

    /// Default database
    #[arg(long, env = "SNOWFLAKE_DATABASE")]
    database: Option<String>,

    /// Default schema
    #[arg(long, env = "SNOWFLAKE_SCHEMA")]
    schema: Option<String>,

    /// Role to use
    #[arg(long, env = "SNOWFLAKE_ROLE")]
    role: Option<String>,

    /// Name of the data share to generate the manifest from
    #[arg(long)]
    share: String,

    /// Output YAML file (defaults to standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// YAML indentation width
    #[arg(long, default_value_t = 2)]
    indent: usize,

    /// Keep keys in document order instead of sorting them
    #[arg(long)]
    no_sort_keys: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

/// Exit status for a run cut short by Ctrl-C, same as any other failure.
const INTERRUPTED_EXIT_CODE: i32 = 1;

fn install_interrupt_handler() {
    let installed = ctrlc::set_handler(|| {
        info!("Manifest generation interrupted by user");
        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
    if let Err(e) = installed {
        warn!("Failed to install interrupt handler: {}", e);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    install_interrupt_handler();

    let options = GenerateOptions {
        account: cli.account,
        host: cli.host,
        user: cli.user,
        password: cli.password,
        private_key_path: cli.private_key_path,
        private_key_passphrase: cli.private_key_passphrase,
        authenticator: cli.authenticator,
        warehouse: cli.warehouse,
        database: cli.database,
        schema: cli.schema,
        role: cli.role,
        share: cli.share,
        output_path: cli.output,
        indent: cli.indent,
        sort_keys: !cli.no_sort_keys,
        verbose: cli.verbose,
    };

    match generate_manifest(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Manifest generation failed: {}", e);
            if options.verbose {
                error!("Full error chain: {:?}", e);
            }
            ExitCode::FAILURE
        }
    }
}
