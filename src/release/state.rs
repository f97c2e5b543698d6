//! Live state of a release as reported by helm.
//!
//! State is never cached: every decision queries helm again, because a stale
//! answer could pick the wrong lifecycle operation.

use std::fmt;

use log::debug;
use serde::Deserialize;

use crate::error::{HelmPilotError, Result};
use crate::helm::{HelmExecutor, HelmInvocation, HelmSettings};

/// Status of a release revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReleaseStatus {
    Deployed,
    Failed,
    PendingInstall,
    PendingUpgrade,
    PendingRollback,
    Uninstalled,
    Uninstalling,
    Superseded,
    Unknown,
}

impl ReleaseStatus {
    /// Parse the status string helm prints (`deployed`, `pending-install`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "deployed" => Some(Self::Deployed),
            "failed" => Some(Self::Failed),
            "pending-install" => Some(Self::PendingInstall),
            "pending-upgrade" => Some(Self::PendingUpgrade),
            "pending-rollback" => Some(Self::PendingRollback),
            "uninstalled" => Some(Self::Uninstalled),
            "uninstalling" => Some(Self::Uninstalling),
            "superseded" => Some(Self::Superseded),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployed => "deployed",
            Self::Failed => "failed",
            Self::PendingInstall => "pending-install",
            Self::PendingUpgrade => "pending-upgrade",
            Self::PendingRollback => "pending-rollback",
            Self::Uninstalled => "uninstalled",
            Self::Uninstalling => "uninstalling",
            Self::Superseded => "superseded",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReleaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current state of an existing release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseState {
    pub name: String,
    pub status: ReleaseStatus,
    pub revision: u32,
}

impl ReleaseState {
    pub fn new(name: impl Into<String>, status: ReleaseStatus, revision: u32) -> Self {
        Self {
            name: name.into(),
            status,
            revision,
        }
    }
}

/// Looks up the current state of a release.
pub trait ReleaseQuery {
    /// `Ok(None)` means the release does not exist; a failed lookup is an
    /// error, never `None`.
    fn get_release(&self, name: &str, namespace: Option<&str>) -> Result<Option<ReleaseState>>;
}

/// Queries release state through `helm list`.
pub struct HelmReleaseQuery<'a, E: HelmExecutor> {
    executor: &'a E,
    settings: &'a HelmSettings,
}

impl<'a, E: HelmExecutor> HelmReleaseQuery<'a, E> {
    pub fn new(executor: &'a E, settings: &'a HelmSettings) -> Self {
        Self { executor, settings }
    }
}

/// `helm list` prints revisions as strings; accept numbers too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Revision {
    Number(u32),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
    revision: Revision,
    status: String,
}

/// Invocation that lists exactly one release, including failed and
/// uninstalled ones.
pub fn list_invocation(name: &str, namespace: Option<&str>) -> HelmInvocation {
    HelmInvocation::new(["list"])
        .switch("--all", true)
        .flag("--filter", Some(format!("^{}$", escape_regex(name))))
        .flag("--namespace", namespace)
        .flag("--output", Some("json"))
}

fn escape_regex(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Parse the JSON printed by `helm list --output json`.
pub fn parse_list_output(name: &str, json: &str) -> Result<Option<ReleaseState>> {
    let query_error = |message: String| HelmPilotError::Query {
        release: name.to_string(),
        message,
    };

    let trimmed = json.trim();
    // Older helm versions print nothing at all when the list is empty
    if trimmed.is_empty() {
        return Ok(None);
    }

    let entries: Vec<ListEntry> = serde_json::from_str(trimmed)
        .map_err(|e| query_error(format!("malformed helm list output: {}", e)))?;

    let mut latest: Option<ReleaseState> = None;
    for entry in entries.into_iter().filter(|e| e.name == name) {
        let revision = match entry.revision {
            Revision::Number(n) => n,
            Revision::Text(s) => s
                .parse()
                .map_err(|_| query_error(format!("malformed revision \"{}\"", s)))?,
        };
        let status = ReleaseStatus::parse(&entry.status)
            .ok_or_else(|| query_error(format!("unrecognized status \"{}\"", entry.status)))?;

        if latest.as_ref().is_none_or(|l| revision > l.revision) {
            latest = Some(ReleaseState::new(entry.name, status, revision));
        }
    }
    Ok(latest)
}

impl<E: HelmExecutor> ReleaseQuery for HelmReleaseQuery<'_, E> {
    fn get_release(&self, name: &str, namespace: Option<&str>) -> Result<Option<ReleaseState>> {
        let invocation = self.settings.apply(list_invocation(name, namespace));
        let output = self.executor.run(&invocation)?;
        if !output.is_success() {
            return Err(HelmPilotError::Query {
                release: name.to_string(),
                message: format!(
                    "`{}` failed: {}",
                    self.executor.describe(&invocation),
                    output.stderr.trim()
                ),
            });
        }

        let state = parse_list_output(name, &output.stdout)?;
        debug!("Queried state of release \"{}\": {:?}", name, state);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helm::CommandOutput;
    use std::cell::RefCell;

    struct Recording {
        output: CommandOutput,
        seen: RefCell<Vec<Vec<String>>>,
    }

    impl HelmExecutor for Recording {
        fn run(&self, invocation: &HelmInvocation) -> Result<CommandOutput> {
            self.seen.borrow_mut().push(invocation.to_args());
            Ok(self.output.clone())
        }
    }

    #[test]
    fn test_parse_status_strings() {
        assert_eq!(ReleaseStatus::parse("deployed"), Some(ReleaseStatus::Deployed));
        assert_eq!(ReleaseStatus::parse("FAILED"), Some(ReleaseStatus::Failed));
        assert_eq!(
            ReleaseStatus::parse("pending-upgrade"),
            Some(ReleaseStatus::PendingUpgrade)
        );
        assert_eq!(
            ReleaseStatus::parse("PENDING_ROLLBACK"),
            Some(ReleaseStatus::PendingRollback)
        );
        assert_eq!(ReleaseStatus::parse("exploded"), None);
    }

    #[test]
    fn test_parse_empty_list() {
        assert_eq!(parse_list_output("web", "[]").unwrap(), None);
        assert_eq!(parse_list_output("web", "\n").unwrap(), None);
    }

    #[test]
    fn test_parse_existing_release() {
        let json = r#"[{"name":"web","namespace":"default","revision":"3","updated":"2024-01-01","status":"failed","chart":"web-0.1.0","app_version":"1.0"}]"#;
        let state = parse_list_output("web", json).unwrap().unwrap();
        assert_eq!(state, ReleaseState::new("web", ReleaseStatus::Failed, 3));
    }

    #[test]
    fn test_parse_ignores_other_names() {
        let json = r#"[{"name":"web-canary","revision":1,"status":"deployed"}]"#;
        assert_eq!(parse_list_output("web", json).unwrap(), None);
    }

    #[test]
    fn test_malformed_output_is_query_error() {
        let err = parse_list_output("web", "not json").unwrap_err();
        assert!(matches!(err, HelmPilotError::Query { ref release, .. } if release == "web"));

        let json = r#"[{"name":"web","revision":"x","status":"deployed"}]"#;
        assert!(matches!(
            parse_list_output("web", json),
            Err(HelmPilotError::Query { .. })
        ));

        let json = r#"[{"name":"web","revision":"1","status":"exploded"}]"#;
        assert!(matches!(
            parse_list_output("web", json),
            Err(HelmPilotError::Query { .. })
        ));
    }

    #[test]
    fn test_list_invocation_escapes_name() {
        let invocation = list_invocation("web.v1", Some("apps"));
        assert_eq!(
            invocation.to_args(),
            vec![
                "list", "--all", "--filter", "^web\\.v1$", "--namespace", "apps", "--output",
                "json"
            ]
        );
    }

    #[test]
    fn test_query_runs_helm_list() {
        let executor = Recording {
            output: CommandOutput::success(r#"[{"name":"web","revision":"2","status":"deployed"}]"#),
            seen: RefCell::new(Vec::new()),
        };
        let settings = HelmSettings {
            kube_context: Some("prod".to_string()),
            ..Default::default()
        };
        let query = HelmReleaseQuery::new(&executor, &settings);

        let state = query.get_release("web", None).unwrap().unwrap();
        assert_eq!(state.status, ReleaseStatus::Deployed);
        assert_eq!(state.revision, 2);

        let seen = executor.seen.borrow();
        assert_eq!(seen[0][0], "list");
        assert!(seen[0].contains(&"--kube-context".to_string()));
    }

    #[test]
    fn test_query_failure_is_not_absence() {
        let executor = Recording {
            output: CommandOutput::failure(1, "Error: Kubernetes cluster unreachable"),
            seen: RefCell::new(Vec::new()),
        };
        let settings = HelmSettings::default();
        let query = HelmReleaseQuery::new(&executor, &settings);

        let err = query.get_release("web", None).unwrap_err();
        assert!(err.to_string().contains("cluster unreachable"));
    }
}
