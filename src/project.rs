//! Configuration phase: turns configuration files into registries of charts,
//! releases and repositories.
//!
//! Nothing here talks to helm. The execution phase (see `reconcile`) only
//! reads what this module builds.

use std::path::{Path, PathBuf};

use crate::chart::{ChartDefaults, ChartRegistry};
use crate::config::{self, Config, GlobalConfig, HelmConfig};
use crate::error::{HelmPilotError, Result};
use crate::helm::HelmSettings;
use crate::release::{ReleaseRegistry, TestOptions};
use crate::repository::HelmRepository;
use crate::value::Provider;

/// A fully configured project.
#[derive(Debug)]
pub struct Project {
    pub dir: PathBuf,
    pub name: String,
    pub executable: PathBuf,
    pub settings: HelmSettings,
    /// Namespace for releases that declare none
    pub default_namespace: Option<String>,
    /// Project-level test defaults, already merged with the user-wide ones
    pub test_defaults: TestOptions,
    pub charts: ChartRegistry,
    pub releases: ReleaseRegistry,
    pub repositories: Vec<HelmRepository>,
}

impl Project {
    /// Load the project in `dir`, plus the user-wide configuration.
    pub fn load(dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = config::load_config(dir, config_path)?;
        let global = config::load_global_config()?;
        Self::from_config(dir, config, global)
    }

    pub fn from_config(dir: &Path, config: Config, global: GlobalConfig) -> Result<Self> {
        let dir = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let name = Provider::from_option(config.project.name.clone())
            .or_else_compute(|| {
                Ok(dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned()))
            })
            .require("project name", &["project.name", "project directory name"])?;

        let helm = merge_helm_config(&config.helm, &global.helm);
        let base_output_dir = dir.join(
            config
                .project
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from("build/helm/charts")),
        );

        let mut charts = ChartRegistry::new(
            &dir,
            ChartDefaults {
                project_name: Some(name.clone()),
                project_version: config.project.version.clone(),
                base_output_dir,
            },
        );
        for (key, declared) in &config.charts {
            let chart = charts.get_or_create(key);
            chart.chart_name = declared.name.clone();
            chart.chart_version = declared.version.clone();
            chart.app_version = declared.app_version.clone();
            chart.update_dependencies = declared.update_dependencies;
            if let Some(source_dir) = &declared.source_dir {
                chart.source_dir = dir.join(source_dir);
            }
        }

        let mut releases = ReleaseRegistry::new();
        for (key, declared) in &config.releases {
            let release = releases.get_or_create(key);
            release.release_name = declared.release_name.clone();
            release.chart = declared.chart.clone();
            release.chart_version = declared.chart_version.clone();
            release.namespace = declared.namespace.clone();
            for (path, value) in &declared.values {
                release
                    .values
                    .insert(path.clone(), set_value_string(path, value)?);
            }
            release.value_files = declared.value_files.iter().map(|f| dir.join(f)).collect();
            release.replace = declared.replace;
            release.reset_values = declared.reset_values;
            release.reuse_values = declared.reuse_values;
            release.wait = declared.wait;
            release.atomic = declared.atomic;
            release.timeout = declared.timeout.clone();
            release.keep_history = declared.keep_history;
            release.test = declared.test.clone();
        }

        let repositories = config
            .repositories
            .iter()
            .map(|(name, declared)| {
                let mut repository = HelmRepository::new(name.as_str(), declared.url.as_str());
                repository.ca_file = declared.ca_file.as_ref().map(|p| dir.join(p));
                repository.credentials = declared.credentials.clone();
                repository.credentials.cert_file =
                    declared.credentials.cert_file.as_ref().map(|p| dir.join(p));
                repository.credentials.key_file =
                    declared.credentials.key_file.as_ref().map(|p| dir.join(p));
                repository
            })
            .collect();

        Ok(Self {
            name,
            executable: helm
                .executable
                .clone()
                .unwrap_or_else(|| PathBuf::from("helm")),
            settings: HelmSettings {
                kube_context: helm.kube_context.clone(),
                kubeconfig: helm.kubeconfig.clone(),
                debug: helm.debug.unwrap_or(false),
            },
            default_namespace: helm.namespace.clone(),
            test_defaults: merge_test_options(&config.test, &global.test),
            charts,
            releases,
            repositories,
            dir,
        })
    }
}

/// Field-wise merge; `primary` wins wherever it is set.
fn merge_helm_config(primary: &HelmConfig, fallback: &HelmConfig) -> HelmConfig {
    HelmConfig {
        executable: primary.executable.clone().or_else(|| fallback.executable.clone()),
        kube_context: primary
            .kube_context
            .clone()
            .or_else(|| fallback.kube_context.clone()),
        kubeconfig: primary.kubeconfig.clone().or_else(|| fallback.kubeconfig.clone()),
        namespace: primary.namespace.clone().or_else(|| fallback.namespace.clone()),
        debug: primary.debug.or(fallback.debug),
    }
}

/// Field-wise merge; `primary` wins wherever it is set.
pub fn merge_test_options(primary: &TestOptions, fallback: &TestOptions) -> TestOptions {
    TestOptions {
        enabled: primary.enabled.or(fallback.enabled),
        show_logs: primary.show_logs.or(fallback.show_logs),
        timeout: primary.timeout.clone().or_else(|| fallback.timeout.clone()),
    }
}

/// Render a configured value in helm's `--set` syntax.
///
/// helm splits `--set` on commas, so commas and backslashes inside strings
/// are escaped. The commas separating `{a,b}` list items are not.
pub fn set_value_string(path: &str, value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(escape_set_string(s)),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(d) => Ok(d.to_string()),
        toml::Value::Array(items) => {
            let rendered = items
                .iter()
                .map(|item| set_value_string(path, item))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("{{{}}}", rendered.join(",")))
        }
        toml::Value::Table(_) => Err(HelmPilotError::Configuration(format!(
            "value \"{}\" is a table; use dotted keys instead",
            path
        ))),
    }
}

fn escape_set_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || c == ',' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::MAIN_CHART;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn test_set_value_rendering() {
        assert_eq!(
            set_value_string("a", &toml::Value::String("x".into())).unwrap(),
            "x"
        );
        assert_eq!(set_value_string("a", &toml::Value::Integer(3)).unwrap(), "3");
        assert_eq!(
            set_value_string("a", &toml::Value::Boolean(true)).unwrap(),
            "true"
        );
        assert_eq!(
            set_value_string(
                "a",
                &toml::Value::Array(vec![toml::Value::Integer(1), toml::Value::Integer(2)])
            )
            .unwrap(),
            "{1,2}"
        );
        assert!(set_value_string("a", &toml::Value::Table(Default::default())).is_err());
    }

    #[test]
    fn test_set_value_escapes_commas() {
        assert_eq!(
            set_value_string(
                "ingress.hosts",
                &toml::Value::String("a.example,b.example".into())
            )
            .unwrap(),
            r"a.example\,b.example"
        );
        assert_eq!(
            set_value_string("path", &toml::Value::String(r"C:\data".into())).unwrap(),
            r"C:\\data"
        );
        assert_eq!(
            set_value_string(
                "hosts",
                &toml::Value::Array(vec![
                    toml::Value::String("a,b".into()),
                    toml::Value::String("c".into()),
                ])
            )
            .unwrap(),
            r"{a\,b,c}"
        );
    }

    #[test]
    fn test_merge_test_options() {
        let project = TestOptions {
            enabled: None,
            show_logs: Some(false),
            timeout: None,
        };
        let global = TestOptions {
            enabled: Some(false),
            show_logs: Some(true),
            timeout: Some("3m".to_string()),
        };
        assert_eq!(
            merge_test_options(&project, &global),
            TestOptions {
                enabled: Some(false),
                show_logs: Some(false),
                timeout: Some("3m".to_string()),
            }
        );
    }

    #[test]
    fn test_from_config() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.project.name = Some("shop".to_string());
        config.helm.namespace = Some("shop".to_string());
        config.charts.insert(
            "worker".to_string(),
            crate::config::ChartConfig {
                source_dir: Some("deploy/worker".into()),
                ..Default::default()
            },
        );
        let mut values = BTreeMap::new();
        values.insert("replicas".to_string(), toml::Value::Integer(2));
        values.insert(
            "ingress.hosts".to_string(),
            toml::Value::String("a.example,b.example".to_string()),
        );
        config.releases.insert(
            "web".to_string(),
            crate::config::ReleaseConfig {
                values,
                value_files: vec!["values.yaml".into()],
                ..Default::default()
            },
        );

        let global = GlobalConfig {
            helm: HelmConfig {
                kube_context: Some("from-global".to_string()),
                namespace: Some("ignored".to_string()),
                ..Default::default()
            },
            test: TestOptions::default(),
        };

        let project = Project::from_config(dir.path(), config, global).unwrap();
        assert_eq!(project.name, "shop");
        assert_eq!(project.executable, PathBuf::from("helm"));
        assert_eq!(project.settings.kube_context.as_deref(), Some("from-global"));
        assert_eq!(project.default_namespace.as_deref(), Some("shop"));
        assert!(project.charts.contains(MAIN_CHART));
        assert_eq!(
            project.charts.get("worker").unwrap().source_dir,
            project.dir.join("deploy/worker")
        );

        let web = project.releases.get("web").unwrap();
        assert_eq!(web.values["replicas"], "2");
        assert_eq!(web.values["ingress.hosts"], r"a.example\,b.example");
        assert_eq!(web.value_files, vec![project.dir.join("values.yaml")]);
    }

    #[test]
    fn test_project_name_defaults_to_directory() {
        let dir = TempDir::new().unwrap();
        let project_dir = dir.path().join("storefront");
        std::fs::create_dir_all(&project_dir).unwrap();

        let project =
            Project::from_config(&project_dir, Config::default(), GlobalConfig::default()).unwrap();
        assert_eq!(project.name, "storefront");
        assert_eq!(
            project.charts.defaults().base_output_dir,
            project.dir.join("build/helm/charts")
        );
    }
}
