//! Command handlers behind the CLI.

use log::info;
use serde_json::json;

use crate::cli::{Cli, Commands};
use crate::error::{HelmPilotError, Result};
use crate::helm::{HelmExecutor, ProcessExecutor};
use crate::project::Project;
use crate::reconcile::{Reconciler, Report};
use crate::release::{ReleasePlan, ReleaseState};

/// Load the project and run one command against it.
pub fn run_command(cli: &Cli) -> Result<()> {
    let project = Project::load(&cli.project_dir, cli.config.as_deref())?;
    let executable = cli
        .helm
        .clone()
        .unwrap_or_else(|| project.executable.clone());
    let executor = ProcessExecutor::new(executable);
    info!("Project \"{}\" in {}", project.name, project.dir.display());

    handle(cli, &project, &executor)
}

/// Run one command with a given executor.
pub fn handle<E: HelmExecutor>(cli: &Cli, project: &Project, executor: &E) -> Result<()> {
    let reconciler = Reconciler::new(project, executor);

    match &cli.command {
        Commands::Package { chart } => match chart {
            Some(chart) => {
                let package = reconciler.package(chart)?;
                println!("{}", package.display());
                Ok(())
            }
            None => summarize("package", reconciler.package_all(), |name, path| {
                format!("{}: {}", name, path.display())
            }),
        },
        Commands::Install { release } => match release {
            Some(release) => {
                let operation = reconciler.install(release)?;
                println!("{}: {}", release, operation);
                Ok(())
            }
            None => summarize("install", reconciler.install_all(), |name, op| {
                format!("{}: {}", name, op)
            }),
        },
        Commands::Plan { release } => match release {
            Some(release) => {
                let plan = reconciler.plan(release)?;
                println!("{}", render_plan(cli, executor, release, &plan));
                Ok(())
            }
            None => summarize("plan", reconciler.plan_all(), |name, plan| {
                render_plan(cli, executor, name, plan)
            }),
        },
        Commands::Test { release } => match release {
            Some(release) => {
                let ran = reconciler.test(release)?;
                println!("{}: {}", release, if ran { "passed" } else { "skipped" });
                Ok(())
            }
            None => summarize("test", reconciler.test_all(), |name, ran| {
                format!("{}: {}", name, if *ran { "passed" } else { "skipped" })
            }),
        },
        Commands::Uninstall { release } => match release {
            Some(release) => {
                let removed = reconciler.uninstall(release)?;
                println!(
                    "{}: {}",
                    release,
                    if removed { "uninstalled" } else { "not installed" }
                );
                Ok(())
            }
            None => summarize("uninstall", reconciler.uninstall_all(), |name, removed| {
                format!(
                    "{}: {}",
                    name,
                    if *removed { "uninstalled" } else { "not installed" }
                )
            }),
        },
        Commands::Rollback { release, revision } => {
            reconciler.rollback(release, *revision)?;
            println!("{}: rolled back", release);
            Ok(())
        }
        Commands::Status { release } => {
            let state = reconciler.status(release)?;
            if cli.json {
                println!(
                    "{}",
                    json!({ "release": release, "state": state.as_ref().map(state_json) })
                );
            } else {
                match state {
                    Some(state) => println!(
                        "{}: {} (revision {})",
                        state.name, state.status, state.revision
                    ),
                    None => println!("{}: not installed", release),
                }
            }
            Ok(())
        }
        Commands::RepoAdd => {
            let count = reconciler.add_repositories()?;
            println!("{} repositories added", count);
            Ok(())
        }
    }
}

/// The helm command of a plan, or a JSON document with `--json`.
fn render_plan<E: HelmExecutor>(
    cli: &Cli,
    executor: &E,
    release: &str,
    plan: &ReleasePlan,
) -> String {
    let command = executor.describe(&plan.invocation);
    if cli.json {
        json!({
            "release": release,
            "operation": plan.operation.to_string(),
            "state": plan.state.as_ref().map(state_json),
            "command": command,
        })
        .to_string()
    } else {
        command
    }
}

fn state_json(state: &ReleaseState) -> serde_json::Value {
    json!({
        "name": state.name,
        "status": state.status.as_str(),
        "revision": state.revision,
    })
}

/// Print one line per item and fail if any item failed.
fn summarize<T, F>(action: &str, reports: Vec<Report<T>>, render: F) -> Result<()>
where
    F: Fn(&str, &T) -> String,
{
    let mut failed = Vec::new();
    for report in &reports {
        match &report.result {
            Ok(value) => println!("{}", render(&report.name, value)),
            Err(e) => {
                eprintln!("{}: {}", report.name, e);
                failed.push(report.name.as_str());
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(HelmPilotError::Batch {
            action: action.to_string(),
            failed: failed.len(),
            total: reports.len(),
            names: failed.join(", "),
        })
    }
}
