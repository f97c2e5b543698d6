pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{HelmPilotError, Result};

pub use types::{
    ChartConfig, Config, GlobalConfig, HelmConfig, ProjectConfig, ReleaseConfig,
    RepositoryConfig,
};

const CONFIG_FILE_NAME: &str = "helm-pilot.toml";
const GLOBAL_CONFIG_FILE_NAME: &str = ".helm-pilot.toml";

/// Get the global config file path (~/.helm-pilot.toml)
pub fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(GLOBAL_CONFIG_FILE_NAME))
}

/// Get the project config file path (project/helm-pilot.toml)
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(CONFIG_FILE_NAME)
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| HelmPilotError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the project configuration.
///
/// An explicit path must exist. Without one, `helm-pilot.toml` in the
/// project directory is used, and a project without the file gets the
/// defaults (just the main chart).
pub fn load_config(project_dir: &Path, explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        debug!("Loading configuration from {}", path.display());
        return read_toml(path);
    }

    let local = local_config_path(project_dir);
    if local.exists() {
        debug!("Loading configuration from {}", local.display());
        return read_toml(&local);
    }

    debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, project_dir.display());
    Ok(Config::default())
}

/// Load the user-wide configuration, if there is one.
pub fn load_global_config() -> Result<GlobalConfig> {
    match global_config_path() {
        Some(path) if path.exists() => {
            debug!("Loading global configuration from {}", path.display());
            read_toml(&path)
        }
        _ => Ok(GlobalConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_local_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_config(dir.path(), None).unwrap(), Config::default());
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let result = load_config(dir.path(), Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(HelmPilotError::Io(_))));
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = TempDir::new().unwrap();
        fs::write(local_config_path(dir.path()), "[releases.web\nchart = ").unwrap();
        let result = load_config(dir.path(), None);
        assert!(matches!(result, Err(HelmPilotError::Toml { .. })));
    }

    #[test]
    fn test_parse_full_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            local_config_path(dir.path()),
            r#"
[project]
name = "shop"
version = "1.4.0"

[helm]
kube_context = "staging"
namespace = "shop"

[test]
show_logs = true

[charts.main]
app_version = "1.4.0"

[charts.worker]
source_dir = "deploy/worker"

[releases.web]
chart = "main"
values = { "image.tag" = "1.4.0", replicas = 3 }
value_files = ["values/prod.yaml"]
atomic = true

[releases.web.test]
timeout = "2m"

[releases.cache]
chart = "bitnami/redis"
chart_version = "17.0.0"
replace = true

[repositories.bitnami]
url = "https://charts.bitnami.com/bitnami"
username = "ci"
password_env = "BITNAMI_PASSWORD"
"#,
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.project.name.as_deref(), Some("shop"));
        assert_eq!(config.helm.kube_context.as_deref(), Some("staging"));
        assert_eq!(config.test.show_logs, Some(true));
        assert_eq!(config.charts.len(), 2);
        assert_eq!(
            config.charts["worker"].source_dir.as_deref(),
            Some(Path::new("deploy/worker"))
        );

        let web = &config.releases["web"];
        assert!(web.atomic);
        assert_eq!(web.values["replicas"], toml::Value::Integer(3));
        assert_eq!(web.test.timeout.as_deref(), Some("2m"));

        let cache = &config.releases["cache"];
        assert!(cache.replace);
        assert_eq!(cache.chart_version.as_deref(), Some("17.0.0"));

        let bitnami = &config.repositories["bitnami"];
        assert_eq!(bitnami.credentials.username.as_deref(), Some("ci"));
        assert_eq!(
            bitnami.credentials.password_env.as_deref(),
            Some("BITNAMI_PASSWORD")
        );
    }
}
