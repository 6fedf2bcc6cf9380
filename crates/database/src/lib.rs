//! # Gradebook Database Crate
//!
//! This crate is the reporting layer over the academic records schema
//! (teachers, disciplines, groups, students, grades).
//!
//! ## Architectural Principles
//!
//! - **Read-only:** Every report is a single `SELECT`; nothing here writes.
//! - **One trait, two stores:** `ReportQueries` is the catalog of reports.
//!   `DbRepository` answers it with parameterised SQL against PostgreSQL;
//!   `MemoryRepository` answers it from a validated in-process snapshot with
//!   identical ordering and rounding.
//! - **Explicit handles:** The pool is created by `connect` and passed in; there
//!   is no global session.
//!
//! ## Public API
//!
//! - `connect`: builds the PostgreSQL connection pool from configuration.
//! - `ReportQueries`: the twelve reports.
//! - `DbRepository`, `MemoryRepository`, `Snapshot`: the two stores.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod queries;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::connect;
pub use error::DbError;
pub use memory::{MemoryRepository, Snapshot};
pub use queries::{ReportQueries, TOP_STUDENTS_LIMIT};
pub use repository::DbRepository;
