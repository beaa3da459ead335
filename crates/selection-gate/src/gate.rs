//! The run/skip evaluation
//!
//! Rules are checked in a fixed order and the first one that applies decides:
//!
//! 1. `destructive_test` without `run_destructive`
//! 2. `expensive_test` without `run_expensive`
//! 3. `skip_if_not_root` when the effective user is not root
//! 4. `skip_if_binaries_missing` when the binaries cannot be resolved
//! 5. `requires_network` when the required network is unreachable
//!
//! Markers are found by kind, so attachment order on the item does not change
//! the outcome. When a kind is attached more than once the first one counts.

use crate::config::RunConfiguration;
use crate::environment::HostEnvironment;
use crate::item::TestItem;
use crate::marker::Marker;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Why a test was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    /// The test category is disabled by the run configuration
    ConfigurationDisabled,
    /// The test needs root
    PrivilegeRequired,
    /// Binaries the test needs are missing
    DependencyMissing,
    /// The network the test needs is unavailable
    NetworkUnavailable,
}

impl fmt::Display for SkipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkipKind::ConfigurationDisabled => "configuration-disabled",
            SkipKind::PrivilegeRequired => "privilege-required",
            SkipKind::DependencyMissing => "dependency-missing",
            SkipKind::NetworkUnavailable => "network-unavailable",
        };
        f.write_str(name)
    }
}

/// A skip with its category and the message shown in test reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipReason {
    kind: SkipKind,
    message: String,
}

impl SkipReason {
    /// Create a skip reason
    pub fn new(kind: SkipKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Skip category
    pub fn kind(&self) -> SkipKind {
        self.kind
    }

    /// Human readable message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of evaluating one test item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// The test runs
    Run,
    /// The test is skipped
    Skip(SkipReason),
}

impl Decision {
    /// Whether the test runs
    pub fn is_run(&self) -> bool {
        matches!(self, Decision::Run)
    }

    /// The skip reason, if skipped
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Decision::Run => None,
            Decision::Skip(reason) => Some(reason),
        }
    }
}

/// Decide whether `item` runs under `config` on the host described by `env`.
///
/// Never fails: every problem surfaces as [`Decision::Skip`].
pub fn evaluate<E>(item: &TestItem, config: &RunConfiguration, env: &E) -> Decision
where
    E: HostEnvironment + ?Sized,
{
    let decision = check_destructive(item, config)
        .or_else(|| check_expensive(item, config))
        .or_else(|| check_root(item, env))
        .or_else(|| check_binaries(item, env))
        .or_else(|| check_network(item, env))
        .map_or(Decision::Run, Decision::Skip);

    match &decision {
        Decision::Run => debug!(test = item.name(), "running"),
        Decision::Skip(reason) => {
            debug!(test = item.name(), kind = %reason.kind(), "skipped: {}", reason.message());
        }
    }

    decision
}

fn check_destructive(item: &TestItem, config: &RunConfiguration) -> Option<SkipReason> {
    let marked = item
        .markers()
        .iter()
        .any(|marker| matches!(marker, Marker::DestructiveTest));

    (marked && !config.run_destructive).then(|| {
        SkipReason::new(
            SkipKind::ConfigurationDisabled,
            "Destructive tests are disabled",
        )
    })
}

fn check_expensive(item: &TestItem, config: &RunConfiguration) -> Option<SkipReason> {
    let marked = item
        .markers()
        .iter()
        .any(|marker| matches!(marker, Marker::ExpensiveTest));

    (marked && !config.run_expensive).then(|| {
        SkipReason::new(
            SkipKind::ConfigurationDisabled,
            "Expensive tests are disabled",
        )
    })
}

fn check_root<E>(item: &TestItem, env: &E) -> Option<SkipReason>
where
    E: HostEnvironment + ?Sized,
{
    let marked = item
        .markers()
        .iter()
        .any(|marker| matches!(marker, Marker::SkipIfNotRoot));

    (marked && env.effective_user_id() != Some(0)).then(|| {
        SkipReason::new(
            SkipKind::PrivilegeRequired,
            "You must be logged in as root to run this test",
        )
    })
}

fn check_binaries<E>(item: &TestItem, env: &E) -> Option<SkipReason>
where
    E: HostEnvironment + ?Sized,
{
    let (binaries, check_all, message) = item.markers().iter().find_map(|marker| match marker {
        Marker::SkipIfBinariesMissing {
            binaries,
            check_all,
            message,
        } => Some((binaries, *check_all, message.as_deref())),
        _ => None,
    })?;

    // Nothing required, nothing missing
    if binaries.is_empty() {
        return None;
    }

    let prefix = message
        .filter(|message| !message.is_empty())
        .map(|message| format!("{message}. "))
        .unwrap_or_default();

    if check_all {
        let missing = binaries.iter().find(|binary| env.which(binary).is_none())?;
        Some(SkipReason::new(
            SkipKind::DependencyMissing,
            format!("{prefix}The \"{missing}\" binary was not found"),
        ))
    } else if env.which_any(binaries).is_none() {
        Some(SkipReason::new(
            SkipKind::DependencyMissing,
            format!(
                "{prefix}None of the following binaries was found: {}",
                binaries.join(", ")
            ),
        ))
    } else {
        None
    }
}

fn check_network<E>(item: &TestItem, env: &E) -> Option<SkipReason>
where
    E: HostEnvironment + ?Sized,
{
    let only_local_network = item.markers().iter().find_map(|marker| match marker {
        Marker::RequiresNetwork { only_local_network } => Some(*only_local_network),
        _ => None,
    })?;

    if only_local_network && !env.has_local_network() {
        return Some(SkipReason::new(
            SkipKind::NetworkUnavailable,
            "No local network was detected",
        ));
    }

    // The external probe runs even for `only_local_network`
    if !env.has_external_network() {
        return Some(SkipReason::new(
            SkipKind::NetworkUnavailable,
            "No internet network connection was detected",
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[derive(Default)]
    struct FakeHost {
        uid: Option<u32>,
        binaries: HashSet<String>,
        local_network: bool,
        external_network: bool,
        local_probes: Cell<usize>,
        external_probes: Cell<usize>,
    }

    impl FakeHost {
        fn with_binaries(binaries: &[&str]) -> Self {
            Self {
                binaries: binaries.iter().map(|b| (*b).to_owned()).collect(),
                ..Self::default()
            }
        }
    }

    impl HostEnvironment for FakeHost {
        fn effective_user_id(&self) -> Option<u32> {
            self.uid
        }

        fn which(&self, binary: &str) -> Option<PathBuf> {
            self.binaries
                .contains(binary)
                .then(|| PathBuf::from("/usr/bin").join(binary))
        }

        fn has_local_network(&self) -> bool {
            self.local_probes.set(self.local_probes.get() + 1);
            self.local_network
        }

        fn has_external_network(&self) -> bool {
            self.external_probes.set(self.external_probes.get() + 1);
            self.external_network
        }
    }

    fn item(markers: Vec<Marker>) -> TestItem {
        markers
            .into_iter()
            .fold(TestItem::new("test_item", "tests/unit/test_item.py"), |item, marker| {
                item.with_marker(marker)
            })
    }

    fn skip_message(decision: &Decision) -> &str {
        decision.skip_reason().map(SkipReason::message).unwrap_or("")
    }

    #[test]
    fn test_no_markers_runs() {
        let decision = evaluate(&item(vec![]), &RunConfiguration::default(), &FakeHost::default());
        assert_eq!(decision, Decision::Run);
    }

    #[test]
    fn test_unregistered_markers_are_ignored() {
        let item = item(vec![Marker::Unregistered {
            name: "flaky".to_owned(),
        }]);
        let decision = evaluate(&item, &RunConfiguration::default(), &FakeHost::default());
        assert!(decision.is_run());
    }

    #[test]
    fn test_destructive_gating() {
        let item = item(vec![Marker::DestructiveTest]);
        let host = FakeHost::default();

        let decision = evaluate(&item, &RunConfiguration::new(false, false), &host);
        assert_eq!(
            decision,
            Decision::Skip(SkipReason::new(
                SkipKind::ConfigurationDisabled,
                "Destructive tests are disabled"
            ))
        );

        let decision = evaluate(&item, &RunConfiguration::new(true, false), &host);
        assert_eq!(decision, Decision::Run);
    }

    #[test]
    fn test_expensive_gating() {
        let item = item(vec![Marker::ExpensiveTest]);
        let host = FakeHost::default();

        let decision = evaluate(&item, &RunConfiguration::new(true, false), &host);
        assert_eq!(skip_message(&decision), "Expensive tests are disabled");

        let decision = evaluate(&item, &RunConfiguration::new(false, true), &host);
        assert!(decision.is_run());
    }

    #[test]
    fn test_destructive_precedes_expensive() {
        // Attachment order must not matter
        let item = item(vec![Marker::ExpensiveTest, Marker::DestructiveTest]);
        let decision = evaluate(&item, &RunConfiguration::new(false, true), &FakeHost::default());

        assert_eq!(skip_message(&decision), "Destructive tests are disabled");
    }

    #[test]
    fn test_root_required() {
        let item = item(vec![Marker::SkipIfNotRoot]);

        let user = FakeHost {
            uid: Some(1000),
            ..FakeHost::default()
        };
        let decision = evaluate(&item, &RunConfiguration::default(), &user);
        assert_eq!(
            decision.skip_reason().map(SkipReason::kind),
            Some(SkipKind::PrivilegeRequired)
        );
        assert_eq!(
            skip_message(&decision),
            "You must be logged in as root to run this test"
        );

        let unknown = FakeHost::default();
        assert!(!evaluate(&item, &RunConfiguration::default(), &unknown).is_run());

        let root = FakeHost {
            uid: Some(0),
            ..FakeHost::default()
        };
        assert!(evaluate(&item, &RunConfiguration::default(), &root).is_run());
    }

    #[test]
    fn test_binaries_any_found() {
        let item = item(vec![Marker::binaries_missing(["nonexistent-xyz", "sh"])]);
        let host = FakeHost::with_binaries(&["sh"]);

        assert!(evaluate(&item, &RunConfiguration::default(), &host).is_run());
    }

    #[test]
    fn test_binaries_none_found() {
        let item = item(vec![Marker::binaries_missing(["nonexistent-xyz", "other-abc"])]);
        let decision = evaluate(&item, &RunConfiguration::default(), &FakeHost::default());

        assert_eq!(
            skip_message(&decision),
            "None of the following binaries was found: nonexistent-xyz, other-abc"
        );
        assert_eq!(
            decision.skip_reason().map(SkipReason::kind),
            Some(SkipKind::DependencyMissing)
        );
    }

    #[test]
    fn test_binaries_check_all_reports_first_missing() {
        let marker = Marker::SkipIfBinariesMissing {
            binaries: vec!["bin1".to_owned(), "bin2".to_owned()],
            check_all: true,
            message: Some("Need both tools".to_owned()),
        };
        let item = item(vec![marker]);

        let only_second = FakeHost::with_binaries(&["bin2"]);
        let decision = evaluate(&item, &RunConfiguration::default(), &only_second);
        assert_eq!(
            skip_message(&decision),
            "Need both tools. The \"bin1\" binary was not found"
        );

        let only_first = FakeHost::with_binaries(&["bin1"]);
        let decision = evaluate(&item, &RunConfiguration::default(), &only_first);
        assert_eq!(
            skip_message(&decision),
            "Need both tools. The \"bin2\" binary was not found"
        );

        let both = FakeHost::with_binaries(&["bin1", "bin2"]);
        assert!(evaluate(&item, &RunConfiguration::default(), &both).is_run());
    }

    #[test]
    fn test_binaries_empty_message_has_no_prefix() {
        let marker = Marker::SkipIfBinariesMissing {
            binaries: vec!["bin1".to_owned()],
            check_all: true,
            message: Some(String::new()),
        };
        let decision = evaluate(&item(vec![marker]), &RunConfiguration::default(), &FakeHost::default());
        assert_eq!(skip_message(&decision), "The \"bin1\" binary was not found");
    }

    #[test]
    fn test_binaries_empty_list_never_skips() {
        let item = item(vec![Marker::binaries_missing(Vec::<String>::new())]);
        assert!(evaluate(&item, &RunConfiguration::default(), &FakeHost::default()).is_run());
    }

    #[test]
    fn test_only_local_network_missing() {
        let item = item(vec![Marker::RequiresNetwork {
            only_local_network: true,
        }]);
        let host = FakeHost {
            external_network: true,
            ..FakeHost::default()
        };

        let decision = evaluate(&item, &RunConfiguration::default(), &host);
        assert_eq!(skip_message(&decision), "No local network was detected");
        assert_eq!(host.external_probes.get(), 0);
    }

    #[test]
    fn test_only_local_network_still_probes_external() {
        let item = item(vec![Marker::RequiresNetwork {
            only_local_network: true,
        }]);
        let host = FakeHost {
            local_network: true,
            ..FakeHost::default()
        };

        let decision = evaluate(&item, &RunConfiguration::default(), &host);
        assert_eq!(
            skip_message(&decision),
            "No internet network connection was detected"
        );
        assert_eq!(host.local_probes.get(), 1);
        assert_eq!(host.external_probes.get(), 1);
    }

    #[test]
    fn test_network_available() {
        let item = item(vec![Marker::RequiresNetwork {
            only_local_network: false,
        }]);
        let host = FakeHost {
            external_network: true,
            ..FakeHost::default()
        };

        assert!(evaluate(&item, &RunConfiguration::default(), &host).is_run());
        // The local probe only matters for `only_local_network`
        assert_eq!(host.local_probes.get(), 0);
    }

    #[test]
    fn test_earlier_rule_short_circuits_probes() {
        let item = item(vec![
            Marker::RequiresNetwork {
                only_local_network: true,
            },
            Marker::DestructiveTest,
        ]);
        let host = FakeHost::default();

        let decision = evaluate(&item, &RunConfiguration::default(), &host);
        assert_eq!(skip_message(&decision), "Destructive tests are disabled");
        assert_eq!(host.local_probes.get(), 0);
        assert_eq!(host.external_probes.get(), 0);
    }

    #[test]
    fn test_first_duplicate_marker_counts() {
        let item = item(vec![
            Marker::binaries_missing(["present"]),
            Marker::binaries_missing(["absent"]),
        ]);
        let host = FakeHost::with_binaries(&["present"]);

        assert!(evaluate(&item, &RunConfiguration::default(), &host).is_run());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let item = item(vec![
            Marker::ExpensiveTest,
            Marker::binaries_missing(["ssh"]),
        ]);
        let config = RunConfiguration::new(false, true);
        let host = FakeHost::default();

        assert_eq!(evaluate(&item, &config, &host), evaluate(&item, &config, &host));
    }

    #[test]
    fn test_evaluate_through_trait_object() {
        let host: Box<dyn HostEnvironment> = Box::new(FakeHost::default());
        let item = item(vec![Marker::SkipIfNotRoot]);

        assert!(!evaluate(&item, &RunConfiguration::default(), host.as_ref()).is_run());
    }

    #[test]
    fn test_decision_serialization() {
        let skip = Decision::Skip(SkipReason::new(
            SkipKind::DependencyMissing,
            "The \"ssh\" binary was not found",
        ));
        let json = serde_json::to_value(&skip).unwrap();

        assert_eq!(json["decision"], "skip");
        assert_eq!(json["kind"], "dependency_missing");
        assert_eq!(json["message"], "The \"ssh\" binary was not found");
        assert_eq!(serde_json::to_value(Decision::Run).unwrap()["decision"], "run");
    }
}
