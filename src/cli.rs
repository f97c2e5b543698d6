use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "helm-pilot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Package Helm charts and reconcile releases from a project file")]
#[command(long_about = "Reads helm-pilot.toml, packages the project's charts and brings each declared release to its desired state, choosing between upgrade --install and install --replace from the live release status.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project directory
    #[arg(short = 'C', long, global = true, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// helm executable to use instead of the configured one
    #[arg(long, global = true, env = "HELM_PILOT_HELM", value_name = "PATH")]
    pub helm: Option<PathBuf>,

    /// Enable verbose logging (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format where applicable
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package a chart (all charts when omitted)
    Package {
        #[arg(value_name = "CHART")]
        chart: Option<String>,
    },

    /// Install or upgrade a release (all releases when omitted)
    Install {
        #[arg(value_name = "RELEASE")]
        release: Option<String>,
    },

    /// Show the helm command `install` would run, without running it
    Plan {
        #[arg(value_name = "RELEASE")]
        release: Option<String>,
    },

    /// Run `helm test` for a release (all releases when omitted)
    Test {
        #[arg(value_name = "RELEASE")]
        release: Option<String>,
    },

    /// Uninstall a release (all releases when omitted)
    Uninstall {
        #[arg(value_name = "RELEASE")]
        release: Option<String>,
    },

    /// Roll a release back
    Rollback {
        #[arg(value_name = "RELEASE")]
        release: String,

        /// Revision to roll back to (previous revision when omitted)
        #[arg(long)]
        revision: Option<u32>,
    },

    /// Show the live state of a release
    Status {
        #[arg(value_name = "RELEASE")]
        release: String,
    },

    /// Register the declared chart repositories with helm
    RepoAdd,
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
