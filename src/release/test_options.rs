//! Options for `helm test`, resolved through release and global defaults.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::helm::HelmInvocation;
use crate::value::Provider;

/// Test options as declared; every field may be left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestOptions {
    pub enabled: Option<bool>,
    pub show_logs: Option<bool>,
    /// Duration string passed to helm as-is, e.g. `5m`
    pub timeout: Option<String>,
}

/// Test options with the defaulting chain applied.
///
/// A snapshot: changing the declared options afterwards does not affect an
/// already resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTestOptions {
    pub enabled: bool,
    /// Absent means helm's own default
    pub show_logs: Option<bool>,
    /// Absent means helm's own default timeout
    pub timeout: Option<String>,
}

impl TestOptions {
    /// Resolve each field independently: release level first, then global.
    /// Only `enabled` has an implicit default (`true`).
    pub fn resolve(&self, global: &TestOptions) -> Result<ResolvedTestOptions> {
        let enabled = Provider::from_option(self.enabled)
            .or(Provider::from_option(global.enabled))
            .or_value(true);
        let show_logs =
            Provider::from_option(self.show_logs).or(Provider::from_option(global.show_logs));
        let timeout = Provider::from_option(self.timeout.clone())
            .or(Provider::from_option(global.timeout.clone()));

        Ok(ResolvedTestOptions {
            enabled: enabled.get()?.unwrap_or(true),
            show_logs: show_logs.get()?,
            timeout: timeout.get()?,
        })
    }
}

/// `helm test` for a release.
pub fn test_invocation(
    release_name: &str,
    namespace: Option<&str>,
    options: &ResolvedTestOptions,
) -> HelmInvocation {
    HelmInvocation::new(["test"])
        .flag("--namespace", namespace)
        .switch("--logs", options.show_logs.unwrap_or(false))
        .flag("--timeout", options.timeout.as_deref())
        .arg(release_name)
}
