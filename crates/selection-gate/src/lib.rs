//! # Selection Gate
//!
//! Decides, per test item, whether a test runs or is skipped.
//!
//! Tests carry markers (`destructive_test`, `requires_network`, ...). The gate
//! evaluates those markers against the process-wide [`RunConfiguration`] and the
//! facts of the current host ([`HostEnvironment`]) in a fixed order and returns a
//! [`Decision`]. Independently, the [`Classifier`] derives category tags such as
//! `integration` or `unit` from a test's file path.
//!
//! # Example
//!
//! ```no_run
//! use selection_gate::{evaluate, Decision, Marker, RunConfiguration, SystemEnvironment, TestItem};
//!
//! let item = TestItem::new("test_useradd", "tests/integration/modules/test_useradd.py")
//!     .with_marker(Marker::DestructiveTest);
//! let config = RunConfiguration::default();
//! let env = SystemEnvironment::new();
//!
//! match evaluate(&item, &config, &env) {
//!     Decision::Run => println!("running {}", item.name()),
//!     Decision::Skip(reason) => println!("skipped: {reason}"),
//! }
//! ```

#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod environment;
pub mod error;
pub mod gate;
pub mod item;
pub mod marker;
pub mod network;
pub mod registry;

pub use classify::{CategoryTag, Classifier, SuiteRule, classify};
pub use config::RunConfiguration;
pub use environment::{HostEnvironment, SystemEnvironment, resolve_binary};
pub use error::{MarkerError, Result};
pub use gate::{Decision, SkipKind, SkipReason, evaluate};
pub use item::TestItem;
pub use marker::{Marker, MarkerValue};
pub use network::{ProbeSettings, probe_external_network, probe_local_network};
pub use registry::{MarkerDeclaration, MarkerRegistry, register_markers};
