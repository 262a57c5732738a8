//! Mode routing
//!
//! The binary only ships a server mode; `generate-config` is handled
//! directly in `main` before any runtime is prepared.

pub mod server;

pub use server::run_server;
