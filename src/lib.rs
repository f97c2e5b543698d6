//! # helm-pilot
//!
//! Packages a project's Helm charts and brings its declared releases to the
//! desired state.
//!
//! Work happens in two phases. The configuration phase reads
//! `helm-pilot.toml` into registries of charts and releases whose values are
//! resolved lazily through fallback chains. The execution phase queries the
//! live state of each release and decides which helm command to run:
//!
//! - `install --replace` when the release asks for replacement or its last
//!   deployment FAILED
//! - `upgrade --install` otherwise, adding `--reset-values`/`--reuse-values`
//!   when the release declares them, whether or not it exists yet
//!
//! ## Example
//!
//! ```rust,no_run
//! use helm_pilot::helm::ProcessExecutor;
//! use helm_pilot::project::Project;
//! use helm_pilot::reconcile::Reconciler;
//! use std::path::Path;
//!
//! # fn main() -> helm_pilot::Result<()> {
//! let project = Project::load(Path::new("./my-service"), None)?;
//! let executor = ProcessExecutor::default();
//! let reconciler = Reconciler::new(&project, &executor);
//! let plan = reconciler.plan("main")?;
//! println!("{}", plan.invocation);
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod helm;
pub mod project;
pub mod reconcile;
pub mod release;
pub mod repository;
pub mod value;

// Re-export commonly used types and functions
pub use error::{HelmPilotError, Result};
pub use release::{ReleaseOperation, ReleaseStatus, select_operation};

/// The current version of helm-pilot
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
