//! Registry of declared charts keyed by name.
//!
//! Charts are created on first reference. The registry always contains the
//! `main` chart, whose name and version fall back to the project's own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::chart::{Chart, ChartDefaults, ResolvedChart};
use crate::error::{HelmPilotError, Result};

/// Key of the implicit chart every project has.
pub const MAIN_CHART: &str = "main";

#[derive(Debug)]
pub struct ChartRegistry {
    project_dir: PathBuf,
    defaults: ChartDefaults,
    charts: BTreeMap<String, Chart>,
}

impl ChartRegistry {
    pub fn new(project_dir: impl Into<PathBuf>, defaults: ChartDefaults) -> Self {
        let project_dir = project_dir.into();
        let mut charts = BTreeMap::new();
        charts.insert(
            MAIN_CHART.to_string(),
            Chart::new(MAIN_CHART, default_source_dir(&project_dir, MAIN_CHART), true),
        );
        Self {
            project_dir,
            defaults,
            charts,
        }
    }

    /// Get a chart, creating it with default settings on first reference.
    pub fn get_or_create(&mut self, name: &str) -> &mut Chart {
        let project_dir = &self.project_dir;
        self.charts.entry(name.to_string()).or_insert_with(|| {
            Chart::new(name, default_source_dir(project_dir, name), false)
        })
    }

    pub fn get(&self, name: &str) -> Option<&Chart> {
        self.charts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.charts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.charts.keys().map(String::as_str)
    }

    pub fn defaults(&self) -> &ChartDefaults {
        &self.defaults
    }

    /// Resolve a chart by key.
    pub fn resolve(&self, name: &str) -> Result<ResolvedChart> {
        let chart = self.get(name).ok_or_else(|| {
            HelmPilotError::Configuration(format!("No chart named \"{}\" is declared", name))
        })?;
        chart.resolve(&self.defaults)
    }
}

/// Source directory a chart uses when none is declared.
pub fn default_source_dir(project_dir: &Path, name: &str) -> PathBuf {
    if name == MAIN_CHART {
        project_dir.join("chart")
    } else {
        project_dir.join("charts").join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChartRegistry {
        ChartRegistry::new(
            "/work/project",
            ChartDefaults {
                project_name: Some("project".to_string()),
                project_version: None,
                base_output_dir: PathBuf::from("/work/project/build/helm/charts"),
            },
        )
    }

    #[test]
    fn test_main_chart_always_present() {
        let registry = registry();
        let main = registry.get(MAIN_CHART).unwrap();
        assert!(main.is_main());
        assert_eq!(main.source_dir, Path::new("/work/project/chart"));
    }

    #[test]
    fn test_get_or_create_creates_once() {
        let mut registry = registry();
        registry.get_or_create("api").chart_version = Some("1.0.0".to_string());
        let api = registry.get_or_create("api");
        assert_eq!(api.chart_version.as_deref(), Some("1.0.0"));
        assert!(!api.is_main());
        assert_eq!(api.source_dir, Path::new("/work/project/charts/api"));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["api", "main"]);
    }

    #[test]
    fn test_resolve_unknown_chart() {
        let registry = registry();
        assert!(matches!(
            registry.resolve("nope"),
            Err(HelmPilotError::Configuration(_))
        ));
    }
}
