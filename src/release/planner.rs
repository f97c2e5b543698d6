//! Chooses the helm lifecycle operation for a release.
//!
//! The choice depends on the declared `replace` override and on the live
//! state of the release:
//!
//! | replace | live state        | operation                |
//! |---------|-------------------|--------------------------|
//! | true    | anything          | `install --replace`      |
//! | false   | absent            | `upgrade --install`      |
//! | false   | status `failed`   | `install --replace`      |
//! | false   | any other status  | `upgrade --install`      |
//!
//! A release stuck in `failed` cannot be upgraded in place, so it is
//! replaced. Flags are assembled only after the operation is chosen.

use std::fmt;

use log::{debug, info, warn};

use crate::error::{HelmPilotError, Result};
use crate::helm::HelmInvocation;
use crate::release::{ReleaseTarget, ResolvedRelease};
use crate::release::state::{ReleaseQuery, ReleaseState, ReleaseStatus};

/// Operation that brings a release to its declared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOperation {
    /// `helm install --replace`
    InstallReplace,
    /// `helm upgrade --install`
    UpgradeInstall {
        reset_values: bool,
        reuse_values: bool,
    },
}

impl ReleaseOperation {
    /// helm command of this operation.
    pub fn command(&self) -> &'static str {
        match self {
            ReleaseOperation::InstallReplace => "install",
            ReleaseOperation::UpgradeInstall { .. } => "upgrade",
        }
    }

    /// Invocation for `release`, flags of the operation first.
    pub fn invocation(&self, release: &ResolvedRelease) -> HelmInvocation {
        let invocation = match *self {
            ReleaseOperation::InstallReplace => {
                HelmInvocation::new([self.command()]).switch("--replace", true)
            }
            ReleaseOperation::UpgradeInstall {
                reset_values,
                reuse_values,
            } => HelmInvocation::new([self.command()])
                .switch("--install", true)
                .switch("--reset-values", reset_values)
                .switch("--reuse-values", reuse_values),
        };

        invocation
            .flag("--namespace", release.namespace.as_deref())
            .flag("--version", release.chart_version())
            .repeated_flag(
                "--values",
                release.value_files.iter().map(|p| p.display().to_string()),
            )
            .repeated_flag("--set", release.values.iter().cloned())
            .switch("--wait", release.wait)
            .switch("--atomic", release.atomic)
            .flag("--timeout", release.timeout.as_deref())
            .arg(release.name.as_str())
            .arg(release.chart_reference())
    }
}

impl fmt::Display for ReleaseOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseOperation::InstallReplace => write!(f, "install --replace"),
            ReleaseOperation::UpgradeInstall { .. } => write!(f, "upgrade --install"),
        }
    }
}

/// Decide the operation from the `replace` override and the live state.
///
/// `reset_values` and `reuse_values` only apply to upgrades and are dropped
/// when the release is replaced.
pub fn select_operation(
    replace: bool,
    state: Option<&ReleaseState>,
    reset_values: bool,
    reuse_values: bool,
) -> ReleaseOperation {
    let upgrade = ReleaseOperation::UpgradeInstall {
        reset_values,
        reuse_values,
    };
    if replace {
        return ReleaseOperation::InstallReplace;
    }
    match state {
        None => upgrade,
        Some(state) if state.status == ReleaseStatus::Failed => ReleaseOperation::InstallReplace,
        Some(_) => upgrade,
    }
}

/// Outcome of planning an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub operation: ReleaseOperation,
    /// State observed while planning
    pub state: Option<ReleaseState>,
    pub invocation: HelmInvocation,
}

/// What to do about a release that should be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallPlan {
    Uninstall(HelmInvocation),
    /// The release does not exist
    Skip,
}

/// Plans lifecycle operations against live release state.
pub struct ReleasePlanner<'a, Q: ReleaseQuery + ?Sized> {
    query: &'a Q,
}

impl<'a, Q: ReleaseQuery + ?Sized> ReleasePlanner<'a, Q> {
    pub fn new(query: &'a Q) -> Self {
        Self { query }
    }

    fn query(&self, name: &str, namespace: Option<&str>) -> Result<Option<ReleaseState>> {
        self.query.get_release(name, namespace)
    }

    /// Plan the install or upgrade of a release.
    ///
    /// The state is queried even when `replace` is set, for logging; a failed
    /// query aborts planning instead of falling back to a default operation.
    pub fn plan(&self, release: &ResolvedRelease) -> Result<ReleasePlan> {
        let state = self.query(&release.name, release.namespace.as_deref())?;
        match &state {
            None => info!(
                "Release \"{}\" does not exist, it will be installed",
                release.name
            ),
            Some(state) => debug!(
                "Release \"{}\" is at revision {} with status {}",
                state.name, state.revision, state.status
            ),
        }

        let operation = select_operation(
            release.replace,
            state.as_ref(),
            release.reset_values,
            release.reuse_values,
        );
        if operation == ReleaseOperation::InstallReplace
            && (release.reset_values || release.reuse_values)
        {
            warn!(
                "Release \"{}\" will be replaced; reset_values and reuse_values do not apply",
                release.name
            );
        }
        info!("Release \"{}\": {}", release.name, operation);

        Ok(ReleasePlan {
            invocation: operation.invocation(release),
            operation,
            state,
        })
    }

    /// Plan the removal of a release; absent releases need nothing.
    pub fn plan_uninstall(&self, release: &ReleaseTarget) -> Result<UninstallPlan> {
        match self.query(&release.name, release.namespace.as_deref())? {
            None => {
                info!(
                    "Release \"{}\" does not exist, nothing to uninstall",
                    release.name
                );
                Ok(UninstallPlan::Skip)
            }
            Some(_) => Ok(UninstallPlan::Uninstall(
                HelmInvocation::new(["uninstall"])
                    .flag("--namespace", release.namespace.as_deref())
                    .switch("--keep-history", release.keep_history)
                    .arg(release.name.as_str()),
            )),
        }
    }

    /// Plan a rollback to `revision`, or to the previous revision when unset.
    pub fn plan_rollback(
        &self,
        release: &ReleaseTarget,
        revision: Option<u32>,
    ) -> Result<HelmInvocation> {
        let state = self
            .query(&release.name, release.namespace.as_deref())?
            .ok_or_else(|| {
                HelmPilotError::Configuration(format!(
                    "Release \"{}\" does not exist, nothing to roll back",
                    release.name
                ))
            })?;
        if let Some(revision) = revision
            && revision >= state.revision
        {
            return Err(HelmPilotError::Configuration(format!(
                "Release \"{}\" is at revision {}; cannot roll back to revision {}",
                release.name, state.revision, revision
            )));
        }

        let mut invocation = HelmInvocation::new(["rollback"])
            .flag("--namespace", release.namespace.as_deref())
            .switch("--wait", release.wait)
            .flag("--timeout", release.timeout.as_deref())
            .arg(release.name.as_str());
        if let Some(revision) = revision {
            invocation = invocation.arg(revision.to_string());
        }
        Ok(invocation)
    }
}
