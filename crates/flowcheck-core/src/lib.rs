//! FlowCheck Core
//!
//! Core types shared by the FlowCheck parser, checks and command line tool.

pub mod config;
pub mod error;
pub mod location;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use location::Location;
pub use types::*;
