//! # Cuppa Architecture
//!
//! Cuppa is a **UI-agnostic coffee expense library**. The `cuppa` binary is one
//! client of it; a web handler or a TUI could drive the same core.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, reads env, formats output              │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Load snapshot, compute next record set, commit           │
//! │  - No terminal assumptions                                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - ExpenseStore trait, compare-and-swap on a Revision       │
//! │  - CsvFileStore, RemoteSnapshotStore, InMemoryStore         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code never prints, never exits and never reads the
//! process environment. Remote credentials arrive through an explicit
//! [`store::github::RemoteConfig`].
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`store`]: Storage abstraction and implementations
//! - [`codec`]: CSV encode/decode shared by the CSV store and import/export
//! - [`model`]: Core data types (`Expense`, `Snapshot`, `Revision`)
//! - [`config`]: Configuration management
//! - [`logging`]: tracing subscriber setup
//! - [`error`]: Error types
//! - `cli`: Argument parsing and rendering for the binary (not part of the lib API)

pub mod api;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
