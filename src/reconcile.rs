//! Execution phase: drives helm for the charts and releases of a project.
//!
//! Each operation resolves what it needs from the [`Project`] first and only
//! then talks to helm, so a configuration error never leaves a release
//! half-handled.

use std::path::PathBuf;

use log::{error, info};

use crate::chart::ResolvedChart;
use crate::error::{HelmPilotError, Result};
use crate::helm::{CommandOutput, HelmExecutor, HelmInvocation, package_invocation};
use crate::project::Project;
use crate::release::test_options::test_invocation;
use crate::release::{
    HelmReleaseQuery, Release, ReleaseOperation, ReleasePlan, ReleasePlanner, ReleaseQuery,
    ReleaseState, ReleaseTarget, ResolvedRelease, UninstallPlan,
};

/// Outcome for one chart or release in a batch run.
#[derive(Debug)]
pub struct Report<T> {
    pub name: String,
    pub result: Result<T>,
}

impl<T> Report<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

pub struct Reconciler<'a, E: HelmExecutor> {
    project: &'a Project,
    executor: &'a E,
}

impl<'a, E: HelmExecutor> Reconciler<'a, E> {
    pub fn new(project: &'a Project, executor: &'a E) -> Self {
        Self { project, executor }
    }

    fn query(&self) -> HelmReleaseQuery<'a, E> {
        HelmReleaseQuery::new(self.executor, &self.project.settings)
    }

    fn declared_release(&self, key: &str) -> Result<&'a Release> {
        self.project.releases.get(key).ok_or_else(|| {
            HelmPilotError::Configuration(format!("No release named \"{}\" is declared", key))
        })
    }

    /// Run a cluster-facing invocation with the connection settings applied.
    fn execute_remote(&self, invocation: HelmInvocation) -> Result<CommandOutput> {
        let invocation = self.project.settings.apply(invocation);
        let output = self.executor.execute(&invocation)?;
        log_output(&output);
        Ok(output)
    }

    pub fn resolve_release(&self, key: &str) -> Result<ResolvedRelease> {
        self.declared_release(key)?
            .resolve(&self.project.charts, self.project.default_namespace.as_deref())
    }

    /// Name and namespace of a declared release, without touching its chart.
    pub fn release_target(&self, key: &str) -> Result<ReleaseTarget> {
        self.declared_release(key)?
            .target(self.project.default_namespace.as_deref())
    }

    /// Package a chart of the project and return the archive path.
    pub fn package(&self, chart_key: &str) -> Result<PathBuf> {
        let chart = self.project.charts.resolve(chart_key)?;
        self.package_resolved(&chart)
    }

    fn package_resolved(&self, chart: &ResolvedChart) -> Result<PathBuf> {
        self.check_archive_name(chart)?;
        std::fs::create_dir_all(&chart.output_dir)?;
        let output = self.executor.execute(&package_invocation(chart))?;
        log_output(&output);

        let package = chart.package_file();
        if !package.is_file() {
            return Err(HelmPilotError::Configuration(format!(
                "helm package did not produce {}",
                package.display()
            )));
        }
        info!("Packaged chart \"{}\" to {}", chart.name, package.display());
        Ok(package)
    }

    /// helm names the archive after the name in Chart.yaml, so a chart name
    /// that differs from it would point releases at a missing file.
    fn check_archive_name(&self, chart: &ResolvedChart) -> Result<()> {
        let declared = self.project.charts.get(&chart.key).ok_or_else(|| {
            HelmPilotError::Configuration(format!(
                "No chart named \"{}\" is declared",
                chart.key
            ))
        })?;
        let descriptor = declared.descriptor()?;
        match descriptor.name.as_deref() {
            Some(name) if name == chart.name => Ok(()),
            Some(name) => Err(HelmPilotError::Configuration(format!(
                "chart \"{}\" resolves to name \"{}\" but {} names it \"{}\"",
                chart.key,
                chart.name,
                declared.chart_file().display(),
                name
            ))),
            None => Err(HelmPilotError::Configuration(format!(
                "chart \"{}\" cannot be packaged: {} has no name",
                chart.key,
                declared.chart_file().display()
            ))),
        }
    }

    /// Package every chart of the project.
    pub fn package_all(&self) -> Vec<Report<PathBuf>> {
        self.project
            .charts
            .names()
            .map(|name| Report {
                name: name.to_string(),
                result: self.package(name),
            })
            .collect()
    }

    /// Decide what `install` would do, without changing anything.
    pub fn plan(&self, key: &str) -> Result<ReleasePlan> {
        let release = self.resolve_release(key)?;
        let query = self.query();
        let mut plan = ReleasePlanner::new(&query).plan(&release)?;
        plan.invocation = self.project.settings.apply(plan.invocation);
        Ok(plan)
    }

    /// Plan every declared release; one failing release does not stop the
    /// others.
    pub fn plan_all(&self) -> Vec<Report<ReleasePlan>> {
        self.for_each_release(|key| self.plan(key))
    }

    /// Install, upgrade or replace a release, packaging its chart first when
    /// it is a chart of this project.
    pub fn install(&self, key: &str) -> Result<ReleaseOperation> {
        let release = self.resolve_release(key)?;
        if let Some(chart) = release.local_chart() {
            self.package_resolved(chart)?;
        }

        let query = self.query();
        let plan = ReleasePlanner::new(&query).plan(&release)?;
        self.execute_remote(plan.invocation)?;
        info!("Release \"{}\" reconciled ({})", release.name, plan.operation);
        Ok(plan.operation)
    }

    /// Reconcile every declared release; one failing release does not stop
    /// the others.
    pub fn install_all(&self) -> Vec<Report<ReleaseOperation>> {
        self.for_each_release(|key| self.install(key))
    }

    /// Run `helm test` unless tests are disabled. Returns whether tests ran.
    pub fn test(&self, key: &str) -> Result<bool> {
        let declared = self.declared_release(key)?;
        let release = self.release_target(key)?;
        let options = declared.test.resolve(&self.project.test_defaults)?;
        if !options.enabled {
            info!("Tests for release \"{}\" are disabled", release.name);
            return Ok(false);
        }

        self.execute_remote(test_invocation(
            &release.name,
            release.namespace.as_deref(),
            &options,
        ))?;
        info!("Tests for release \"{}\" passed", release.name);
        Ok(true)
    }

    pub fn test_all(&self) -> Vec<Report<bool>> {
        self.for_each_release(|key| self.test(key))
    }

    /// Uninstall a release. Returns false when there was nothing to remove.
    pub fn uninstall(&self, key: &str) -> Result<bool> {
        let release = self.release_target(key)?;
        let query = self.query();
        match ReleasePlanner::new(&query).plan_uninstall(&release)? {
            UninstallPlan::Skip => Ok(false),
            UninstallPlan::Uninstall(invocation) => {
                self.execute_remote(invocation)?;
                info!("Release \"{}\" uninstalled", release.name);
                Ok(true)
            }
        }
    }

    pub fn uninstall_all(&self) -> Vec<Report<bool>> {
        self.for_each_release(|key| self.uninstall(key))
    }

    pub fn rollback(&self, key: &str, revision: Option<u32>) -> Result<()> {
        let release = self.release_target(key)?;
        let query = self.query();
        let invocation = ReleasePlanner::new(&query).plan_rollback(&release, revision)?;
        self.execute_remote(invocation)?;
        info!("Release \"{}\" rolled back", release.name);
        Ok(())
    }

    /// Current state of a declared release.
    pub fn status(&self, key: &str) -> Result<Option<ReleaseState>> {
        let release = self.release_target(key)?;
        self.query()
            .get_release(&release.name, release.namespace.as_deref())
    }

    /// Register every declared repository with helm.
    pub fn add_repositories(&self) -> Result<usize> {
        for repository in &self.project.repositories {
            let invocation = repository.add_invocation()?;
            let output = self.executor.execute(&invocation)?;
            log_output(&output);
            info!("Repository \"{}\" added", repository.name);
        }
        Ok(self.project.repositories.len())
    }

    fn for_each_release<T, F>(&self, op: F) -> Vec<Report<T>>
    where
        F: Fn(&str) -> Result<T>,
    {
        self.project
            .releases
            .names()
            .map(|key| {
                let result = op(key);
                if let Err(e) = &result {
                    error!("Release \"{}\": {}", key, e);
                }
                Report {
                    name: key.to_string(),
                    result,
                }
            })
            .collect()
    }
}

fn log_output(output: &CommandOutput) {
    for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
        info!("{}", line);
    }
}
