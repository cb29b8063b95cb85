//! Account identifier resolution from `--account` / `--host` values

use reqwest::Url;

use crate::error::ManifestError;

const SNOWFLAKE_DOMAIN_SUFFIX: &str = ".snowflakecomputing.com";

/// Turn a full Snowflake URL into an account identifier.
///
/// - `https://myaccount.snowflakecomputing.com` -> `myaccount`
/// - `https://myaccount.region.cloud.snowflakecomputing.com` -> `myaccount.region.cloud`
/// - `myaccount.region.cloud` is returned unchanged
///
/// A URL on some other domain yields its hostname.
pub fn parse_account_from_url(account_or_url: &str) -> String {
    if !(account_or_url.starts_with("http://") || account_or_url.starts_with("https://")) {
        return account_or_url.to_string();
    }

    let hostname = Url::parse(account_or_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));

    match hostname {
        Some(host) => match host.strip_suffix(SNOWFLAKE_DOMAIN_SUFFIX) {
            Some(account) => account.to_string(),
            None => host,
        },
        None => account_or_url.to_string(),
    }
}

/// Pick the account identifier from the CLI values, preferring `host`.
pub fn resolve_account(account: Option<&str>, host: Option<&str>) -> Result<String, ManifestError> {
    let account_param = match (host, account) {
        (Some(host), _) if host.starts_with("http://") || host.starts_with("https://") => {
            host.to_string()
        }
        (Some(host), _) => format!("https://{}", host),
        (None, Some(account)) => account.to_string(),
        (None, None) => return Err(ManifestError::MissingAccount),
    };

    Ok(parse_account_from_url(&account_param))
}
