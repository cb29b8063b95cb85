//! Key-pair authentication: private key file checks and JWT signing

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jwt_simple::prelude::*;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::ManifestError;

/// Snowflake rejects tokens that live longer than an hour.
const TOKEN_LIFETIME_MINUTES: u64 = 59;

/// Read a PEM private key from disk.
///
/// The file must be a readable, non-empty regular file. Group or world
/// access on Unix only produces a warning.
pub fn read_private_key(path: &Path) -> Result<String, ManifestError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ManifestError::PrivateKeyNotFound {
            path: path.to_path_buf(),
        },
        _ => ManifestError::PrivateKeyRead {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_file() {
        return Err(ManifestError::PrivateKeyRead {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                "Private key file {} is accessible by group or others (mode {:o}); consider chmod 600",
                path.display(),
                mode & 0o777
            );
        }
    }

    let contents = fs::read_to_string(path).map_err(|e| ManifestError::PrivateKeyRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if contents.trim().is_empty() {
        return Err(ManifestError::PrivateKeyEmpty {
            path: path.to_path_buf(),
        });
    }

    Ok(contents)
}

/// An RSA key pair ready to sign Snowflake login tokens.
pub struct KeyPairCredentials {
    key_pair: RS256KeyPair,
    fingerprint: String,
}

impl fmt::Debug for KeyPairCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPairCredentials")
            .field("fingerprint", &self.fingerprint)
            .finish_non_exhaustive()
    }
}

impl KeyPairCredentials {
    /// Decode a PKCS#8 (optionally encrypted) or PKCS#1 PEM key.
    pub fn from_pem(pem: &str, passphrase: Option<&str>) -> Result<Self, ManifestError> {
        let decode_error = |message: String| ManifestError::PrivateKeyDecode { message };

        let private_key = match passphrase {
            Some(passphrase) => RsaPrivateKey::from_pkcs8_encrypted_pem(pem, passphrase.as_bytes())
                .map_err(|e| decode_error(e.to_string()))?,
            None => match RsaPrivateKey::from_pkcs8_pem(pem) {
                Ok(key) => key,
                Err(pkcs8_err) => RsaPrivateKey::from_pkcs1_pem(pem).map_err(|_| {
                    decode_error(format!("not a PKCS#8 or PKCS#1 RSA key ({})", pkcs8_err))
                })?,
            },
        };

        let public_der = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(|e| decode_error(e.to_string()))?;
        let fingerprint = format!(
            "SHA256:{}",
            STANDARD.encode(Sha256::digest(public_der.as_bytes()))
        );

        let private_der = private_key
            .to_pkcs8_der()
            .map_err(|e| decode_error(e.to_string()))?;
        let key_pair = RS256KeyPair::from_der(private_der.as_bytes())
            .map_err(|e| decode_error(e.to_string()))?;

        Ok(Self {
            key_pair,
            fingerprint,
        })
    }

    /// `SHA256:<base64>` fingerprint of the public key, as registered on the user.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Sign a login token for `account_name` (the account locator, no region) and `user`.
    pub fn token(&self, account_name: &str, user: &str) -> Result<String, ManifestError> {
        let qualified_user = format!("{}.{}", account_name.to_uppercase(), user.to_uppercase());
        let claims = Claims::create(Duration::from_mins(TOKEN_LIFETIME_MINUTES))
            .with_issuer(format!("{}.{}", qualified_user, self.fingerprint))
            .with_subject(qualified_user);

        self.key_pair
            .sign(claims)
            .map_err(|e| ManifestError::PrivateKeyDecode {
                message: format!("failed to sign login token: {}", e),
            })
    }
}
