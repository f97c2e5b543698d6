use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::credentials::CredentialsConfig;
use crate::release::TestOptions;

/// Project configuration file (`helm-pilot.toml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub helm: HelmConfig,
    /// Test defaults for every release of the project
    pub test: TestOptions,
    pub charts: BTreeMap<String, ChartConfig>,
    pub releases: BTreeMap<String, ReleaseConfig>,
    pub repositories: BTreeMap<String, RepositoryConfig>,
}

/// User-wide configuration file (`~/.helm-pilot.toml`).
///
/// Only connection settings and test defaults live here; project files win
/// over both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub helm: HelmConfig,
    pub test: TestOptions,
}

/// Project identity and layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Defaults to the project directory name
    pub name: Option<String>,
    pub version: Option<String>,
    /// Base directory for packaged charts, default `build/helm/charts`
    pub output_dir: Option<PathBuf>,
}

/// How to reach helm and the cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmConfig {
    pub executable: Option<PathBuf>,
    pub kube_context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
    /// Namespace for releases that do not declare one
    pub namespace: Option<String>,
    pub debug: Option<bool>,
}

/// A chart of the project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub name: Option<String>,
    pub version: Option<String>,
    pub app_version: Option<String>,
    pub update_dependencies: Option<bool>,
    pub source_dir: Option<PathBuf>,
}

/// A release to reconcile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    pub release_name: Option<String>,
    pub chart: Option<String>,
    pub chart_version: Option<String>,
    pub namespace: Option<String>,
    pub values: BTreeMap<String, toml::Value>,
    pub value_files: Vec<PathBuf>,
    pub replace: bool,
    pub reset_values: bool,
    pub reuse_values: bool,
    pub wait: bool,
    pub atomic: bool,
    pub timeout: Option<String>,
    pub keep_history: bool,
    pub test: TestOptions,
}

/// A chart repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub url: String,
    pub ca_file: Option<PathBuf>,
    #[serde(flatten)]
    pub credentials: CredentialsConfig,
}
