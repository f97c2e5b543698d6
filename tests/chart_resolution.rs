use std::fs;
use std::path::Path;

use helm_pilot::HelmPilotError;
use helm_pilot::chart::{ChartDefaults, ChartRegistry, MAIN_CHART};
use helm_pilot::helm::package_invocation;
use tempfile::TempDir;

fn registry(project_dir: &Path, name: Option<&str>, version: Option<&str>) -> ChartRegistry {
    ChartRegistry::new(
        project_dir,
        ChartDefaults {
            project_name: name.map(str::to_string),
            project_version: version.map(str::to_string),
            base_output_dir: project_dir.join("build/helm/charts"),
        },
    )
}

#[test]
fn test_main_chart_from_descriptor() {
    let dir = TempDir::new().unwrap();
    let chart_dir = dir.path().join("chart");
    fs::create_dir_all(&chart_dir).unwrap();
    fs::write(
        chart_dir.join("Chart.yaml"),
        "apiVersion: v2\nname: foo\nversion: 0.1.0\n",
    )
    .unwrap();

    let charts = registry(dir.path(), Some("project"), Some("9.9.9"));
    let chart = charts.resolve(MAIN_CHART).unwrap();

    assert_eq!(chart.name, "foo");
    assert_eq!(chart.version, "0.1.0");
    assert!(!chart.update_dependencies);
    assert_eq!(
        chart.package_file(),
        dir.path().join("build/helm/charts/foo/foo-0.1.0.tgz")
    );

    let invocation = package_invocation(&chart);
    assert_eq!(
        invocation.to_args(),
        vec![
            "package".to_string(),
            "--destination".to_string(),
            dir.path().join("build/helm/charts/foo").display().to_string(),
            "--version".to_string(),
            "0.1.0".to_string(),
            chart_dir.display().to_string(),
        ]
    );
}

#[test]
fn test_v1_chart_reads_requirements() {
    let dir = TempDir::new().unwrap();
    let chart_dir = dir.path().join("charts/api");
    fs::create_dir_all(&chart_dir).unwrap();
    fs::write(chart_dir.join("Chart.yaml"), "name: api\nversion: 2.0.0\n").unwrap();
    fs::write(
        chart_dir.join("requirements.yaml"),
        "dependencies:\n  - name: redis\n    version: 17.0.0\n    repository: https://charts.bitnami.com/bitnami\n",
    )
    .unwrap();

    let mut charts = registry(dir.path(), None, None);
    charts.get_or_create("api");
    let chart = charts.resolve("api").unwrap();

    let dependencies = charts.get("api").unwrap().dependencies().unwrap();
    assert_eq!(dependencies.len(), 1);
    assert_eq!(dependencies[0].name, "redis");
    assert!(chart.update_dependencies);
    assert!(
        package_invocation(&chart)
            .to_args()
            .contains(&"--dependency-update".to_string())
    );
}

#[test]
fn test_unresolvable_version_names_sources() {
    let dir = TempDir::new().unwrap();
    let chart_dir = dir.path().join("chart");
    fs::create_dir_all(&chart_dir).unwrap();
    fs::write(chart_dir.join("Chart.yaml"), "apiVersion: v2\nname: foo\n").unwrap();

    let charts = registry(dir.path(), Some("foo"), None);
    let err = charts.resolve(MAIN_CHART).unwrap_err();
    match err {
        HelmPilotError::Configuration(message) => {
            assert!(message.contains("chart version for chart \"main\""));
            assert!(message.contains("charts.main.version"));
            assert!(message.contains("project.version"));
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}
