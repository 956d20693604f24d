//! Git plumbing for td-conformance.
//!
//! This crate defines the [`GitRepo`] trait, the single interface through
//! which the harness touches git. The corpus and the workspace materializer
//! program against the trait; [`CliRepo`] is the only backend.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`GitRepo`] trait definition.
//! - [`types`]: value types used in trait signatures ([`GitOid`],
//!   [`StatusEntry`]).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.

pub mod error;
pub mod repo;
pub mod types;

mod cli_repo;

pub use cli_repo::CliRepo;

pub use error::GitError;
pub use repo::GitRepo;
pub use types::{GitOid, OidParseError, StatusEntry};
