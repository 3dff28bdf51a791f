//! Quote teams for a construction firm.
//!
//! The crate assembles the tools, the forms a client fills in and two
//! applications on top of [`quote_crew_core`]: the builders team that
//! answers detailed home quotes, and the road proposal pipeline. It ships a
//! CLI for using in the terminal, and every piece can be used as a library.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod collector;
mod config;
mod error;
pub mod pipeline;
mod render;
pub mod team;
pub mod tools;

pub use config::{AppConfig, ConfigError, TEAM_TEMPERATURE};
pub use error::Error;
pub use render::render_result;

/// Re-exports of [`quote_crew_core`] crate.
pub mod core {
    pub use quote_crew_core::*;
}
