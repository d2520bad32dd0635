//! Voice-platform webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use super::error::ValidationError;

/// Configuration for the inbound voice-platform webhook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret expected in the `x-webhook-secret` header. When unset,
    /// the webhook accepts unauthenticated events (local development only).
    pub secret: Option<SecretString>,
}

impl WebhookConfig {
    /// Creates a config with a fixed secret. Mostly for tests.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(SecretString::new(secret.into())),
        }
    }

    /// Checks a presented header value against the configured secret in
    /// constant time. `None` header with a configured secret fails; no
    /// configured secret accepts anything.
    pub fn authorizes(&self, presented: Option<&str>) -> bool {
        match (&self.secret, presented) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(expected), Some(presented)) => {
                let expected = expected.expose_secret().as_bytes();
                expected.ct_eq(presented.as_bytes()).into()
            }
        }
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(secret) = &self.secret {
            if secret.expose_secret().trim().is_empty() {
                return Err(ValidationError::BlankWebhookSecret);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_secret_accepts_any_header() {
        let config = WebhookConfig::default();
        assert!(config.authorizes(None));
        assert!(config.authorizes(Some("anything")));
    }

    #[test]
    fn configured_secret_requires_exact_match() {
        let config = WebhookConfig::with_secret("whsec-123");
        assert!(config.authorizes(Some("whsec-123")));
        assert!(!config.authorizes(Some("whsec-12")));
        // Containment is not enough; the comparison is exact.
        assert!(!config.authorizes(Some("prefix-whsec-123-suffix")));
        assert!(!config.authorizes(None));
    }

    #[test]
    fn blank_secret_fails_validation() {
        let config = WebhookConfig::with_secret("   ");
        assert!(config.validate().is_err());
        assert!(WebhookConfig::with_secret("whsec-123").validate().is_ok());
    }
}
