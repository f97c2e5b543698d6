//! Boundary to the helm executable.
//!
//! Everything above this module works with [`HelmInvocation`] values; only
//! [`ProcessExecutor`] actually spawns helm.

pub mod executor;
pub mod invocation;

use std::path::PathBuf;

pub use executor::{CommandOutput, HelmExecutor, ProcessExecutor};
pub use invocation::{FlagValue, HelmInvocation};

use crate::chart::ResolvedChart;

/// Connection settings shared by every command that talks to the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelmSettings {
    pub kube_context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    pub debug: bool,
}

impl HelmSettings {
    /// Append the connection flags to a cluster-facing invocation.
    pub fn apply(&self, invocation: HelmInvocation) -> HelmInvocation {
        invocation
            .flag("--kube-context", self.kube_context.as_deref())
            .flag(
                "--kubeconfig",
                self.kubeconfig.as_ref().map(|p| p.display().to_string()),
            )
            .switch("--debug", self.debug)
    }
}

/// `helm package` for a resolved chart.
pub fn package_invocation(chart: &ResolvedChart) -> HelmInvocation {
    HelmInvocation::new(["package"])
        .flag("--destination", Some(chart.output_dir.display().to_string()))
        .flag("--version", Some(chart.version.as_str()))
        .flag("--app-version", chart.app_version.as_deref())
        .switch("--dependency-update", chart.update_dependencies)
        .arg(chart.source_dir.display().to_string())
}
