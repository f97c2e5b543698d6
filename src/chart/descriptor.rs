//! Chart.yaml model.
//!
//! Parses the chart manifest into an immutable [`ChartDescriptor`]. Name and
//! version are optional here; a chart declaration may override them, and
//! only the resolution step treats their absence as an error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HelmPilotError, Result};

/// File name of the chart manifest inside a chart directory.
pub const CHART_FILE_NAME: &str = "Chart.yaml";

/// File name of the v1 dependency manifest inside a chart directory.
pub const REQUIREMENTS_FILE_NAME: &str = "requirements.yaml";

/// Helm Chart API version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// Helm 2 style charts, dependencies live in requirements.yaml
    #[default]
    V1,
    /// Helm 3 style charts, dependencies are embedded in Chart.yaml
    V2,
    /// Anything else; treated like v2 for dependency purposes
    Other(String),
}

impl ApiVersion {
    pub fn as_str(&self) -> &str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
            ApiVersion::Other(s) => s,
        }
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "v1" => ApiVersion::V1,
            "v2" => ApiVersion::V2,
            other => ApiVersion::Other(other.to_string()),
        })
    }
}

impl Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// A dependency declaration, either embedded in Chart.yaml or listed in
/// requirements.yaml.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DependencyRef {
    /// Dependency chart name
    pub name: String,
    /// Version constraint (SemVer)
    pub version: Option<String>,
    /// Repository URL or alias
    pub repository: Option<String>,
    /// Condition for enabling
    pub condition: Option<String>,
    /// Tags for enabling
    #[serde(default)]
    pub tags: Vec<String>,
    /// Alias for the dependency
    pub alias: Option<String>,
}

/// Parsed Chart.yaml metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChartDescriptor {
    /// Absent `apiVersion` means a Helm 2 chart
    #[serde(rename = "apiVersion", default)]
    pub api_version: ApiVersion,

    pub name: Option<String>,

    #[serde(default, deserialize_with = "scalar_string")]
    pub version: Option<String>,

    #[serde(rename = "appVersion", default, deserialize_with = "scalar_string")]
    pub app_version: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

/// Accept unquoted integer versions such as `appVersion: 2`.
///
/// Floats are rejected: YAML reads `1.10` as the number 1.1, which would
/// silently change the version.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_yaml::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) if n.is_f64() => Err(serde::de::Error::custom(
            format!("version {} is read as a number; quote it", n),
        )),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(serde::de::Error::custom("expected a version string")),
    }
}

/// Shape of a v1 requirements.yaml.
#[derive(Debug, Default, Deserialize)]
struct Requirements {
    #[serde(default)]
    dependencies: Vec<DependencyRef>,
}

impl ChartDescriptor {
    /// Parse Chart.yaml content. `path` is only used for error context.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| parse_error(path, e))
    }

    /// Load and parse a Chart.yaml file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HelmPilotError::Parse {
            path: path.to_path_buf(),
            message: format!("Failed to read file: {}", e),
        })?;
        Self::parse(&content, path)
    }

    pub fn is_v1(&self) -> bool {
        self.api_version == ApiVersion::V1
    }
}

/// Load the dependency list of a v1 chart.
///
/// A missing file is not an error and yields no dependencies. An empty file
/// is treated the same way.
pub fn load_requirements(path: &Path) -> Result<Vec<DependencyRef>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let requirements: Requirements =
        serde_yaml::from_str(&content).map_err(|e| parse_error(path, e))?;
    Ok(requirements.dependencies)
}

/// Dependencies of a chart, honoring where its API version keeps them.
///
/// v1 charts list dependencies in a separate requirements file; every other
/// API version embeds them and the requirements file is never consulted.
pub fn resolve_dependencies(
    descriptor: &ChartDescriptor,
    requirements_path: &Path,
) -> Result<Vec<DependencyRef>> {
    if descriptor.is_v1() {
        load_requirements(requirements_path)
    } else {
        Ok(descriptor.dependencies.clone())
    }
}

fn parse_error(path: &Path, e: serde_yaml::Error) -> HelmPilotError {
    let message = match e.location() {
        Some(location) => format!("line {}: {}", location.line(), e),
        None => e.to_string(),
    };
    HelmPilotError::Parse {
        path: path.to_path_buf(),
        message,
    }
}
