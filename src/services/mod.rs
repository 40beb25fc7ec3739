//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the mutation protocol and its transactions so route
//! handlers stay focused on request parsing and auth plumbing.

pub mod comment;
pub mod session;
pub mod thread;
pub mod tx;
pub mod vote;
