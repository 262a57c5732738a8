//! shorturls - A URL shortener with expiring shortcodes
//!
//! This library provides the core functionality for the shorturls service:
//! an in-memory shortcode store, click statistics, audit logging and the
//! HTTP facade on top of them.
//!
//! # Architecture
//! - `store`: Shortcode store (create / resolve / click / stats)
//! - `audit`: Audit event sinks (tracing, remote HTTP, in-memory)
//! - `api`: HTTP services
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging initialization

pub mod api;
pub mod audit;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod store;
pub mod system;
pub mod utils;
