//! HMAC-SHA512 authentication for Kraken Futures.
//!
//! Kraken Futures signs each private request over
//! `postdata + nonce + endpoint`, where `endpoint` is the API path with any
//! leading `/derivatives` stripped. The message is SHA-256 hashed, then
//! HMAC-SHA512 signed with the base64-decoded API secret, and the signature
//! is base64 encoded into the `Authent` header.
//!
//! # Security
//!
//! - The API secret is loaded from the environment and held as a
//!   [`SecretString`]; it is never logged.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256, Sha512};
use std::time::{SystemTime, UNIX_EPOCH};

use follower_core::{AgentError, Result};

type HmacSha512 = Hmac<Sha512>;

/// Environment variable names for Kraken credentials.
#[derive(Debug, Clone)]
pub struct KrakenAuthConfig {
    pub api_key_env: String,
    pub api_secret_env: String,
}

impl Default for KrakenAuthConfig {
    fn default() -> Self {
        Self {
            api_key_env: "KRAKEN_API_KEY".to_string(),
            api_secret_env: "KRAKEN_API_SECRET".to_string(),
        }
    }
}

/// Headers required for an authenticated Kraken Futures request.
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// `APIKey` header.
    pub api_key: String,

    /// `Authent` header (base64-encoded signature).
    pub authent: String,
}

/// Request signer for the Kraken Futures private API.
pub struct KrakenAuth {
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for KrakenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrakenAuth")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

impl KrakenAuth {
    /// Creates a signer from an API key and its base64-encoded secret.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: SecretString) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret,
        }
    }

    /// Creates a signer from environment variables.
    ///
    /// # Errors
    /// Returns [`AgentError::Configuration`] if a variable is missing.
    pub fn from_env(config: &KrakenAuthConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            AgentError::Configuration(format!(
                "missing environment variable: {}",
                config.api_key_env
            ))
        })?;
        let api_secret = std::env::var(&config.api_secret_env).map_err(|_| {
            AgentError::Configuration(format!(
                "missing environment variable: {}",
                config.api_secret_env
            ))
        })?;

        Ok(Self::new(api_key, SecretString::from(api_secret)))
    }

    /// Returns the API key for the `APIKey` header.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns a millisecond-timestamp nonce.
    #[must_use]
    pub fn nonce() -> String {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string()
    }

    /// Signs one request, producing the `APIKey` / `Authent` header pair.
    ///
    /// # Arguments
    /// * `endpoint` - Full API path (e.g. "/derivatives/api/v3/accounts")
    /// * `postdata` - Form-encoded body, nonce included
    /// * `nonce` - The nonce embedded in `postdata`
    ///
    /// # Errors
    /// Returns [`AgentError::Configuration`] if the secret is not valid
    /// base64.
    pub fn sign(&self, endpoint: &str, postdata: &str, nonce: &str) -> Result<SignedHeaders> {
        // The signature path excludes the /derivatives prefix.
        let path = endpoint.strip_prefix("/derivatives").unwrap_or(endpoint);

        let message = format!("{postdata}{nonce}{path}");
        let digest = Sha256::digest(message.as_bytes());

        let secret = BASE64
            .decode(self.api_secret.expose_secret())
            .map_err(|e| AgentError::Configuration(format!("API secret is not valid base64: {e}")))?;

        let mut mac = HmacSha512::new_from_slice(&secret)
            .map_err(|e| AgentError::Configuration(format!("invalid HMAC key: {e}")))?;
        mac.update(&digest);

        Ok(SignedHeaders {
            api_key: self.api_key.clone(),
            authent: BASE64.encode(mac.finalize().into_bytes()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_auth() -> KrakenAuth {
        // Base64 of "test-secret-bytes".
        let secret = BASE64.encode(b"test-secret-bytes");
        KrakenAuth::new("test-key", SecretString::from(secret))
    }

    #[test]
    fn test_signature_is_deterministic() {
        let auth = test_auth();
        let a = auth
            .sign("/derivatives/api/v3/accounts", "nonce=1", "1")
            .unwrap();
        let b = auth
            .sign("/derivatives/api/v3/accounts", "nonce=1", "1")
            .unwrap();
        assert_eq!(a.authent, b.authent);
    }

    #[test]
    fn test_derivatives_prefix_is_stripped_before_signing() {
        let auth = test_auth();
        let with_prefix = auth
            .sign("/derivatives/api/v3/accounts", "nonce=1", "1")
            .unwrap();
        let without_prefix = auth.sign("/api/v3/accounts", "nonce=1", "1").unwrap();
        assert_eq!(with_prefix.authent, without_prefix.authent);
    }

    #[test]
    fn test_signature_varies_with_endpoint() {
        let auth = test_auth();
        let accounts = auth
            .sign("/derivatives/api/v3/accounts", "nonce=1", "1")
            .unwrap();
        let positions = auth
            .sign("/derivatives/api/v3/openpositions", "nonce=1", "1")
            .unwrap();
        assert_ne!(accounts.authent, positions.authent);
    }

    #[test]
    fn test_signature_is_valid_base64() {
        let auth = test_auth();
        let headers = auth
            .sign("/derivatives/api/v3/accounts", "nonce=1&symbol=pf_adausd", "1")
            .unwrap();
        // HMAC-SHA512 output is 64 bytes.
        assert_eq!(BASE64.decode(&headers.authent).unwrap().len(), 64);
    }

    #[test]
    fn test_non_base64_secret_is_rejected() {
        let auth = KrakenAuth::new("k", SecretString::from("not base64!!!"));
        let err = auth.sign("/api/v3/accounts", "nonce=1", "1").unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn test_from_env_missing_key() {
        let config = KrakenAuthConfig {
            api_key_env: "TEST_KRAKEN_MISSING_KEY".to_string(),
            api_secret_env: "TEST_KRAKEN_MISSING_SECRET".to_string(),
        };
        let err = KrakenAuth::from_env(&config).unwrap_err();
        assert!(err.to_string().contains("missing environment variable"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = test_auth();
        let debug = format!("{auth:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-secret-bytes"));
    }

    #[test]
    fn test_nonce_is_millisecond_scale() {
        assert!(KrakenAuth::nonce().len() >= 13);
    }
}
