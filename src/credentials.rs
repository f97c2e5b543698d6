//! Credentials for chart repositories.
//!
//! Objects that need credentials hold a [`CredentialsConfig`] and expose it
//! through the [`CredentialsContainer`] capability instead of resolving
//! secrets themselves.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{HelmPilotError, Result};
use crate::value::Provider;

/// Resolved credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Password { username: String, password: String },
    Certificate { cert_file: PathBuf, key_file: PathBuf },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Certificate {
                cert_file,
                key_file,
            } => f
                .debug_struct("Certificate")
                .field("cert_file", cert_file)
                .field("key_file", key_file)
                .finish(),
        }
    }
}

/// Something that can supply credentials.
pub trait CredentialsContainer {
    /// `Ok(None)` when no credentials are configured.
    fn credentials(&self) -> Result<Option<Credentials>>;
}

/// Declared credentials; the password may come from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Environment variable holding the password
    pub password_env: Option<String>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

impl CredentialsConfig {
    /// The password: declared, then read from `password_env`.
    pub fn password(&self) -> Provider<'_, String> {
        Provider::from_option(self.password.clone()).or_else_compute(|| {
            Ok(self
                .password_env
                .as_deref()
                .and_then(|var| std::env::var(var).ok()))
        })
    }

    fn password_sources(&self) -> Vec<String> {
        let mut sources = vec!["password".to_string()];
        if let Some(var) = &self.password_env {
            sources.push(format!("environment variable {}", var));
        }
        sources
    }
}

impl CredentialsContainer for CredentialsConfig {
    fn credentials(&self) -> Result<Option<Credentials>> {
        if let Some(username) = &self.username {
            let sources = self.password_sources();
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            let password = self
                .password()
                .require(&format!("password for user \"{}\"", username), &sources)?;
            return Ok(Some(Credentials::Password {
                username: username.clone(),
                password,
            }));
        }

        match (&self.cert_file, &self.key_file) {
            (Some(cert_file), Some(key_file)) => Ok(Some(Credentials::Certificate {
                cert_file: cert_file.clone(),
                key_file: key_file.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(HelmPilotError::Configuration(
                "cert_file and key_file must be set together".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_credentials() {
        assert_eq!(CredentialsConfig::default().credentials().unwrap(), None);
    }

    #[test]
    fn test_explicit_password() {
        let config = CredentialsConfig {
            username: Some("ci".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.credentials().unwrap(),
            Some(Credentials::Password {
                username: "ci".to_string(),
                password: "secret".to_string(),
            })
        );
    }

    #[test]
    fn test_password_from_environment() {
        let var = "HELM_PILOT_TEST_REPO_PASSWORD_FROM_ENV";
        // SAFETY: the variable name is unique to this test
        unsafe { std::env::set_var(var, "from-env") };
        let config = CredentialsConfig {
            username: Some("ci".to_string()),
            password_env: Some(var.to_string()),
            ..Default::default()
        };
        match config.credentials().unwrap() {
            Some(Credentials::Password { password, .. }) => assert_eq!(password, "from-env"),
            other => panic!("unexpected credentials: {other:?}"),
        }
    }

    #[test]
    fn test_username_without_password_is_error() {
        let config = CredentialsConfig {
            username: Some("ci".to_string()),
            password_env: Some("HELM_PILOT_TEST_UNSET_PASSWORD".to_string()),
            ..Default::default()
        };
        let err = config.credentials().unwrap_err();
        assert!(err.to_string().contains("password for user \"ci\""));
        assert!(err.to_string().contains("HELM_PILOT_TEST_UNSET_PASSWORD"));
    }

    #[test]
    fn test_certificate_credentials() {
        let config = CredentialsConfig {
            cert_file: Some("client.crt".into()),
            key_file: Some("client.key".into()),
            ..Default::default()
        };
        assert!(matches!(
            config.credentials().unwrap(),
            Some(Credentials::Certificate { .. })
        ));

        let partial = CredentialsConfig {
            cert_file: Some("client.crt".into()),
            ..Default::default()
        };
        assert!(partial.credentials().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let credentials = Credentials::Password {
            username: "ci".to_string(),
            password: "secret".to_string(),
        };
        assert!(!format!("{:?}", credentials).contains("secret"));
    }
}
