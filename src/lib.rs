//! Conformance harness for target determinators.
//!
//! A target determinator takes a repository and two revisions and reports
//! the build targets whose behavior may differ between them. This crate
//! runs a catalog of scenarios against any such tool and judges the
//! reported labels:
//!
//! - [`label`]: canonical target labels and label sets.
//! - [`corpus`]: named workspace snapshots, from a corpus repository or
//!   bundled fixtures.
//! - [`materialize`]: disposable git workspaces built from snapshots.
//! - [`adapter`]: the [`Determinator`](adapter::Determinator) trait and the
//!   adapters for concrete tools.
//! - [`matcher`]: tolerant comparison of reported and expected labels.
//! - [`scenario`], [`profile`], [`runner`]: the catalog, per-adapter
//!   treatments, and the engine that runs one against the other.
//!
//! The `tdc` binary (in `crates/tdc-cli`) is the command-line front end.

pub mod adapter;
pub mod config;
pub mod corpus;
pub mod label;
pub mod matcher;
pub mod materialize;
pub mod profile;
pub mod runner;
pub mod scenario;

pub use label::{InvalidLabelError, Label, TargetSet};
pub use runner::{RunOptions, Runner, SuiteReport, Verdict};
