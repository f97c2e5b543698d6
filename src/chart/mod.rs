//! Declared charts and their resolution into concrete packaging parameters.
//!
//! A [`Chart`] holds what the user declared (possibly nothing but a source
//! directory). Resolution combines the declaration with the chart's
//! Chart.yaml and the project defaults, yielding an immutable
//! [`ResolvedChart`] that the packaging step only reads.

pub mod descriptor;
pub mod registry;

use std::path::{Path, PathBuf};

use log::debug;
use once_cell::unsync::OnceCell;

use crate::chart::descriptor::{
    CHART_FILE_NAME, ChartDescriptor, DependencyRef, REQUIREMENTS_FILE_NAME, resolve_dependencies,
};
use crate::error::Result;
use crate::value::Provider;

pub use descriptor::ApiVersion;
pub use registry::{ChartRegistry, MAIN_CHART};

/// Project-level values a chart falls back to.
#[derive(Debug, Clone, Default)]
pub struct ChartDefaults {
    pub project_name: Option<String>,
    pub project_version: Option<String>,
    pub base_output_dir: PathBuf,
}

/// A chart declared in the project.
#[derive(Debug)]
pub struct Chart {
    key: String,
    is_main: bool,
    /// Overrides the name from Chart.yaml
    pub chart_name: Option<String>,
    /// Overrides the version from Chart.yaml
    pub chart_version: Option<String>,
    pub app_version: Option<String>,
    /// Run `helm dependency update` while packaging; derived from the
    /// dependency list when unset
    pub update_dependencies: Option<bool>,
    pub source_dir: PathBuf,
    descriptor: OnceCell<ChartDescriptor>,
}

/// A chart with every parameter bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChart {
    pub key: String,
    pub name: String,
    pub version: String,
    pub app_version: Option<String>,
    pub update_dependencies: bool,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Chart {
    pub(crate) fn new(key: impl Into<String>, source_dir: PathBuf, is_main: bool) -> Self {
        Self {
            key: key.into(),
            is_main,
            chart_name: None,
            chart_version: None,
            app_version: None,
            update_dependencies: None,
            source_dir,
            descriptor: OnceCell::new(),
        }
    }

    /// Registry key of this chart.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// Path of the chart manifest.
    pub fn chart_file(&self) -> PathBuf {
        self.source_dir.join(CHART_FILE_NAME)
    }

    /// The parsed Chart.yaml, loaded on first access.
    pub fn descriptor(&self) -> Result<&ChartDescriptor> {
        self.descriptor.get_or_try_init(|| {
            let path = self.chart_file();
            debug!("Loading chart descriptor from {}", path.display());
            ChartDescriptor::load(&path)
        })
    }

    /// Dependencies of this chart, read from wherever its API version keeps them.
    pub fn dependencies(&self) -> Result<Vec<DependencyRef>> {
        resolve_dependencies(
            self.descriptor()?,
            &self.source_dir.join(REQUIREMENTS_FILE_NAME),
        )
    }

    /// Resolve the effective chart name: declared, then Chart.yaml, then
    /// (main chart only) the project name.
    pub fn resolve_name(&self, defaults: &ChartDefaults) -> Result<String> {
        let project_name = if self.is_main {
            defaults.project_name.clone()
        } else {
            None
        };
        let field = format!("charts.{}.name", self.key);
        let manifest = format!("name in {}", self.chart_file().display());
        let mut sources = vec![field.as_str(), manifest.as_str()];
        if self.is_main {
            sources.push("project.name");
        }

        Provider::from_option(self.chart_name.clone())
            .or_else_compute(|| Ok(self.descriptor()?.name.clone()))
            .or(Provider::from_option(project_name))
            .require(&format!("chart name for chart \"{}\"", self.key), &sources)
    }

    /// Resolve the effective chart version: declared, then Chart.yaml, then
    /// (main chart only) the project version.
    pub fn resolve_version(&self, defaults: &ChartDefaults) -> Result<String> {
        let project_version = if self.is_main {
            defaults.project_version.clone()
        } else {
            None
        };
        let field = format!("charts.{}.version", self.key);
        let manifest = format!("version in {}", self.chart_file().display());
        let mut sources = vec![field.as_str(), manifest.as_str()];
        if self.is_main {
            sources.push("project.version");
        }

        Provider::from_option(self.chart_version.clone())
            .or_else_compute(|| Ok(self.descriptor()?.version.clone()))
            .or(Provider::from_option(project_version))
            .require(&format!("chart version for chart \"{}\"", self.key), &sources)
    }

    /// Bind every parameter of this chart.
    pub fn resolve(&self, defaults: &ChartDefaults) -> Result<ResolvedChart> {
        let name = self.resolve_name(defaults)?;
        let version = self.resolve_version(defaults)?;
        // Chart.yaml is only read when something above is left undeclared
        let update_dependencies = Provider::from_option(self.update_dependencies)
            .or_else_compute(|| Ok(Some(!self.dependencies()?.is_empty())))
            .require(
                &format!("dependency update for chart \"{}\"", self.key),
                &["update_dependencies", "Chart.yaml dependencies"],
            )?;

        Ok(ResolvedChart {
            key: self.key.clone(),
            output_dir: defaults.base_output_dir.join(&name),
            name,
            version,
            app_version: self.app_version.clone(),
            update_dependencies,
            source_dir: self.source_dir.clone(),
        })
    }
}

/// File name of a packaged chart.
pub fn package_file_name(name: &str, version: &str) -> String {
    format!("{}-{}.tgz", name, version)
}

impl ResolvedChart {
    pub fn package_file_name(&self) -> String {
        package_file_name(&self.name, &self.version)
    }

    /// Where `helm package` writes the archive.
    pub fn package_file(&self) -> PathBuf {
        self.output_dir.join(self.package_file_name())
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }
}
