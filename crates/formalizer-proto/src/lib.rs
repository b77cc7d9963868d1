//! The modification-request protocol: a staged batch of proposed Graph
//! changes, validated atomically, then applied to an in-memory
//! `formalizer_core::GraphStore`.
//!
//! The shared-memory/TCP transport that would carry these requests
//! between a client and a server process is an external collaborator
//! this repository does not build: `Batch::validate`/`Batch::apply` are
//! plain function calls, not remote procedure calls.

pub mod batch;
pub mod request;

pub use batch::{Batch, ModRequestError, ModResult};
pub use request::ModRequest;
