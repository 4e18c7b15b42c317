//! # Query Lab Database Crate
//!
//! This crate acts as the application-specific interface to the PostgreSQL
//! database holding the AdventureWorks subset the demos query.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application talks to
//!   [`DbRepository`] methods and plain row structs.
//! - **Asynchronous & Pooled:** Operations are asynchronous and share one
//!   connection pool (`PgPool`) created at startup.
//! - **Explicit change tracking:** sqlx has no unit of work, so
//!   [`tracking::ChangeTracker`] provides snapshot-based change detection for
//!   the demos that contrast tracked and untracked reads.
//!
//! ## Public API
//!
//! - `connect`: establishes the connection pool from [`configuration::DatabaseSettings`].
//! - `run_migrations`: applies the embedded schema and sample data.
//! - `DbRepository`: all data access methods.
//! - `DbError`: errors, already classified into unavailable / constraint / query.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod models;
pub mod repository;
pub mod tracking;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use models::{
    AccountAggregate, BusinessEntityContact, Customer, CustomerGraph, CustomerListItem,
    CustomerModificationAge, EmailAddress, Person, PersonGraph, Store,
};
pub use repository::DbRepository;
pub use tracking::{ChangeTracker, Trackable, Tracked};
