//! # Query Lab Engine
//!
//! The interpreter at the heart of the harness: [`DemoRunner`] reads commands
//! and dispatches them, [`DemoEngine`] is the set of operations it can run,
//! and [`SqlDemoEngine`] implements those operations against PostgreSQL.

pub mod demo;
pub mod error;
pub mod runner;

pub use demo::{DemoEngine, SqlDemoEngine};
pub use error::EngineError;
pub use runner::{DemoRunner, INVALID_COMMAND, LISTING_HEADER, PROMPT};
