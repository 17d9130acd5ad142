//! Secret handling
//!
//! The API credential lives in a `SecretString` that is wiped from memory on
//! drop and never shows up in `Debug` output.

use serde::{Deserialize, Deserializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Clone, Zeroize, ZeroizeOnDrop, Default)]
pub struct SecretString(String);

impl SecretString {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Read a secret from an environment variable, ignoring blank values
    pub fn from_env_optional(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(Self)
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "SecretString(<empty>)")
        } else {
            write!(f, "SecretString(***)")
        }
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_value() {
        let secret = SecretString::from_str("sk-test-123");
        let printed = format!("{:?}", secret);
        assert!(!printed.contains("sk-test-123"));
        assert_eq!(printed, "SecretString(***)");
    }

    #[test]
    fn test_blank_secret_is_empty() {
        assert!(SecretString::from_str("   ").is_empty());
        assert!(!SecretString::from_str("sk").is_empty());
    }

    #[test]
    fn test_expose_returns_original() {
        let secret: SecretString = "abc".to_string().into();
        assert_eq!(secret.expose_secret(), "abc");
    }

    #[test]
    fn test_deserialize_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            key: SecretString,
        }
        let holder: Holder = toml::from_str(r#"key = "sk-from-file""#).unwrap();
        assert_eq!(holder.key.expose_secret(), "sk-from-file");
    }
}
