//! # Query Lab Core Types
//!
//! The command vocabulary shared by every other crate: what a command is, which
//! demo operation it triggers, and how the ordered catalog of commands resolves
//! user input.
//!
//! This is a Layer 0 crate. It has no knowledge of the database, configuration
//! or the console.

pub mod catalog;
pub mod command;
pub mod display;
pub mod enums;
pub mod error;

// Re-export the core types to provide a clean public API.
pub use catalog::{CommandCatalog, demo_catalog};
pub use command::Command;
pub use enums::{CommandAction, ControlAction, DemoOperation};
pub use display::{label_of, require_label_of};
pub use error::CoreError;
