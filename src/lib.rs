//! `turbine-predict` library crate.
//!
//! The binary (`turbine`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes or binding sockets
//! - the dispatcher can be reused by other front-ends (batch jobs, notebooks)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod registry;
pub mod report;
pub mod server;
