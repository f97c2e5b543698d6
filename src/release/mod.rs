//! Declared releases and their resolution into concrete parameters.

pub mod planner;
pub mod state;
pub mod test_options;

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::warn;

use crate::chart::{ChartRegistry, MAIN_CHART, ResolvedChart};
use crate::error::Result;
use crate::value::Provider;

pub use planner::{ReleaseOperation, ReleasePlan, ReleasePlanner, UninstallPlan, select_operation};
pub use state::{HelmReleaseQuery, ReleaseQuery, ReleaseState, ReleaseStatus};
pub use test_options::{ResolvedTestOptions, TestOptions};

/// A release as declared in the project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Release {
    key: String,
    /// Defaults to the registry key
    pub release_name: Option<String>,
    /// Key of a declared chart, or any reference helm understands
    /// (`repo/chart`, `oci://...`, a path). Defaults to the main chart.
    pub chart: Option<String>,
    /// Version of a remote chart
    pub chart_version: Option<String>,
    pub namespace: Option<String>,
    /// `--set` values, keyed by dotted path
    pub values: BTreeMap<String, String>,
    pub value_files: Vec<PathBuf>,
    pub replace: bool,
    pub reset_values: bool,
    pub reuse_values: bool,
    pub wait: bool,
    pub atomic: bool,
    pub timeout: Option<String>,
    /// Passed to `helm uninstall`
    pub keep_history: bool,
    pub test: TestOptions,
}

/// Where the chart of a release comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    /// A chart of this project, installed from its packaged archive
    Local(ResolvedChart),
    /// A chart reference passed to helm untouched
    Remote {
        reference: String,
        version: Option<String>,
    },
}

/// What operations that never touch the chart need to know about a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTarget {
    pub name: String,
    pub namespace: Option<String>,
    pub wait: bool,
    pub timeout: Option<String>,
    pub keep_history: bool,
}

/// A release with every parameter bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub key: String,
    pub name: String,
    pub chart: ChartSource,
    pub namespace: Option<String>,
    pub values: Vec<String>,
    pub value_files: Vec<PathBuf>,
    pub replace: bool,
    pub reset_values: bool,
    pub reuse_values: bool,
    pub wait: bool,
    pub atomic: bool,
    pub timeout: Option<String>,
    pub keep_history: bool,
}

impl Release {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Effective release name.
    pub fn name(&self) -> &str {
        self.release_name.as_deref().unwrap_or(&self.key)
    }

    /// Effective namespace: declared, then the global default.
    pub fn resolve_namespace(&self, default_namespace: Option<&str>) -> Result<Option<String>> {
        Provider::from_option(self.namespace.clone())
            .or(Provider::from_option(default_namespace.map(str::to_string)))
            .get()
    }

    /// Bind name and namespace only; the chart is left unresolved.
    pub fn target(&self, default_namespace: Option<&str>) -> Result<ReleaseTarget> {
        Ok(ReleaseTarget {
            name: self.name().to_string(),
            namespace: self.resolve_namespace(default_namespace)?,
            wait: self.wait,
            timeout: self.timeout.clone(),
            keep_history: self.keep_history,
        })
    }

    /// Bind every parameter, resolving a local chart through the registry.
    pub fn resolve(
        &self,
        charts: &ChartRegistry,
        default_namespace: Option<&str>,
    ) -> Result<ResolvedRelease> {
        let chart_key = self.chart.as_deref().unwrap_or(MAIN_CHART);
        let chart = if charts.contains(chart_key) {
            if self.chart_version.is_some() {
                warn!(
                    "Release \"{}\" uses the project chart \"{}\"; chart_version is ignored",
                    self.name(),
                    chart_key
                );
            }
            ChartSource::Local(charts.resolve(chart_key)?)
        } else {
            ChartSource::Remote {
                reference: chart_key.to_string(),
                version: self.chart_version.clone(),
            }
        };

        Ok(ResolvedRelease {
            key: self.key.clone(),
            name: self.name().to_string(),
            chart,
            namespace: self.resolve_namespace(default_namespace)?,
            values: self
                .values
                .iter()
                .map(|(key, value)| format!("{}={}", key, value))
                .collect(),
            value_files: self.value_files.clone(),
            replace: self.replace,
            reset_values: self.reset_values,
            reuse_values: self.reuse_values,
            wait: self.wait,
            atomic: self.atomic,
            timeout: self.timeout.clone(),
            keep_history: self.keep_history,
        })
    }
}

impl ResolvedRelease {
    /// Chart argument passed to helm.
    pub fn chart_reference(&self) -> String {
        match &self.chart {
            ChartSource::Local(chart) => chart.package_file().display().to_string(),
            ChartSource::Remote { reference, .. } => reference.clone(),
        }
    }

    /// `--version` of a remote chart; a packaged archive needs none.
    pub fn chart_version(&self) -> Option<&str> {
        match &self.chart {
            ChartSource::Local(_) => None,
            ChartSource::Remote { version, .. } => version.as_deref(),
        }
    }

    pub fn local_chart(&self) -> Option<&ResolvedChart> {
        match &self.chart {
            ChartSource::Local(chart) => Some(chart),
            ChartSource::Remote { .. } => None,
        }
    }
}

/// Registry of declared releases keyed by name.
#[derive(Debug, Default)]
pub struct ReleaseRegistry {
    releases: BTreeMap<String, Release>,
}

impl ReleaseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a release, creating it on first reference.
    pub fn get_or_create(&mut self, key: &str) -> &mut Release {
        self.releases
            .entry(key.to_string())
            .or_insert_with(|| Release::new(key))
    }

    pub fn get(&self, key: &str) -> Option<&Release> {
        self.releases.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Release> {
        self.releases.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.releases.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartDefaults;
    use std::path::Path;
    use tempfile::TempDir;

    fn registry(dir: &Path) -> ChartRegistry {
        let mut charts = ChartRegistry::new(
            dir,
            ChartDefaults {
                project_name: Some("project".to_string()),
                project_version: Some("1.0.0".to_string()),
                base_output_dir: dir.join("build"),
            },
        );
        let main = charts.get_or_create(MAIN_CHART);
        main.chart_name = Some("web".to_string());
        main.chart_version = Some("0.2.0".to_string());
        main.update_dependencies = Some(false);
        charts
    }

    #[test]
    fn test_release_name_defaults_to_key() {
        let mut release = Release::new("web");
        assert_eq!(release.name(), "web");
        release.release_name = Some("web-prod".to_string());
        assert_eq!(release.name(), "web-prod");
    }

    #[test]
    fn test_resolve_local_chart() {
        let dir = TempDir::new().unwrap();
        let charts = registry(dir.path());
        let mut release = Release::new("web");
        release.values.insert("image.tag".to_string(), "1.0".to_string());

        let resolved = release.resolve(&charts, Some("default")).unwrap();
        assert_eq!(
            resolved.chart_reference(),
            dir.path().join("build/web/web-0.2.0.tgz").display().to_string()
        );
        assert_eq!(resolved.chart_version(), None);
        assert_eq!(resolved.namespace.as_deref(), Some("default"));
        assert_eq!(resolved.values, vec!["image.tag=1.0"]);
        assert!(resolved.local_chart().is_some());
    }

    #[test]
    fn test_resolve_remote_chart() {
        let dir = TempDir::new().unwrap();
        let charts = registry(dir.path());
        let mut release = Release::new("cache");
        release.chart = Some("bitnami/redis".to_string());
        release.chart_version = Some("17.0.0".to_string());
        release.namespace = Some("infra".to_string());

        let resolved = release.resolve(&charts, Some("default")).unwrap();
        assert_eq!(resolved.chart_reference(), "bitnami/redis");
        assert_eq!(resolved.chart_version(), Some("17.0.0"));
        assert_eq!(resolved.namespace.as_deref(), Some("infra"));
        assert!(resolved.local_chart().is_none());
    }

    #[test]
    fn test_target_ignores_chart() {
        let mut release = Release::new("web");
        release.chart = Some("missing".to_string());
        release.keep_history = true;

        let target = release.target(Some("apps")).unwrap();
        assert_eq!(target.name, "web");
        assert_eq!(target.namespace.as_deref(), Some("apps"));
        assert!(target.keep_history);
    }

    #[test]
    fn test_namespace_absent_everywhere() {
        let release = Release::new("web");
        assert_eq!(release.resolve_namespace(None).unwrap(), None);
    }

    #[test]
    fn test_release_registry() {
        let mut releases = ReleaseRegistry::new();
        assert!(releases.is_empty());
        releases.get_or_create("web").replace = true;
        assert!(releases.get_or_create("web").replace);
        assert_eq!(releases.names().collect::<Vec<_>>(), vec!["web"]);
    }
}
