//! Chart repositories registered with `helm repo add`.

use std::path::PathBuf;

use crate::credentials::{Credentials, CredentialsConfig, CredentialsContainer};
use crate::error::Result;
use crate::helm::HelmInvocation;

/// A chart repository; credentials are delegated to its [`CredentialsConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelmRepository {
    pub name: String,
    pub url: String,
    pub ca_file: Option<PathBuf>,
    pub credentials: CredentialsConfig,
}

impl CredentialsContainer for HelmRepository {
    fn credentials(&self) -> Result<Option<Credentials>> {
        self.credentials.credentials()
    }
}

impl HelmRepository {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ca_file: None,
            credentials: CredentialsConfig::default(),
        }
    }

    /// `helm repo add` for this repository, with credentials resolved now.
    pub fn add_invocation(&self) -> Result<HelmInvocation> {
        let mut invocation = HelmInvocation::new(["repo", "add"]).switch("--force-update", true);
        match self.credentials()? {
            Some(Credentials::Password { username, password }) => {
                // stdin keeps the password out of the process list
                invocation = invocation
                    .flag("--username", Some(username))
                    .switch("--password-stdin", true)
                    .stdin(password);
            }
            Some(Credentials::Certificate {
                cert_file,
                key_file,
            }) => {
                invocation = invocation
                    .flag("--cert-file", Some(cert_file.display().to_string()))
                    .flag("--key-file", Some(key_file.display().to_string()));
            }
            None => {}
        }
        Ok(invocation
            .flag(
                "--ca-file",
                self.ca_file.as_ref().map(|p| p.display().to_string()),
            )
            .arg(self.name.as_str())
            .arg(self.url.as_str()))
    }
}
