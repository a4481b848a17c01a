//! Consul integration
//!
//! ACL provisioning (policies, tokens) and KV configuration upload over
//! the HTTP API, plus parsing helpers for the one operation that has to
//! go through the CLI: the initial ACL bootstrap inside a server container.

pub mod acl;
pub mod bootstrap;
pub mod error;

// Re-exports
pub use acl::{AccessControl, ConsulAcl, CreatedPolicy};
pub use bootstrap::{ANONYMOUS_TOKEN_EVIDENCE, parse_bootstrap_secret};
pub use error::{AclError, Result};
