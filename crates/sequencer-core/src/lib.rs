// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Sequencer Core - Email Sequence Storage
//!
//! This crate stores email sequences (a named campaign with open/click
//! tracking flags) and their ordered steps, and exposes the use cases that
//! create and modify them. A sequence and all of its steps are written in a
//! single transaction: either everything becomes visible or nothing does.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Delivery Layer                                  │
//! │              (HTTP handlers, CLI, message consumers)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//!                                    │ RequestContext + DTOs
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SequenceWorkflow                                  │
//! │         (begins, commits and rolls back one transaction per call)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//!                                    │ &mut Transaction
//!                                    ▼
//! ┌───────────────────────┐                    ┌─────────────────────────────┐
//! │    SequenceStore      │                    │    DatastoreBootstrap       │
//! │  Postgres / SQLite    │◄───── Pool ────────│  retry + one-time init      │
//! └───────────────────────┘                    └─────────────────────────────┘
//!           │
//!           ▼
//! ┌───────────────────────┐
//! │ PostgreSQL / SQLite   │
//! └───────────────────────┘
//! ```
//!
//! # Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `create_sequence` | Insert a sequence and its steps atomically, return the new id |
//! | `get_sequence` | Load a live sequence with live steps ordered by `step_order` |
//! | `update_step` | Patch subject/content of one step; absent fields are kept |
//! | `update_sequence_tracking` | Patch the open/click tracking flags |
//! | `delete_step` | Soft-delete one step scoped to its sequence |
//!
//! # Creation
//!
//! ```text
//! Started ──► SequenceInserted ──► StepsInserted ──► Committed
//!    │               │                   │
//!    └───────────────┴───────────────────┴──► RolledBack
//! ```
//!
//! # Configuration
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEQUENCER_DATABASE_URL` | - | `postgres://...` or `sqlite:...` URL |
//! | `SEQUENCER_DB_HOST` / `_PORT` / `_USER` / `_PASSWORD` / `_NAME` / `_SSL_MODE` | port `5432`, `disable` | Parts of a PostgreSQL URL, used when the full URL is absent |
//! | `SEQUENCER_DB_MAX_OPEN_CONNS` | `50` | Maximum pool connections |
//! | `SEQUENCER_DB_MAX_IDLE_CONNS` | `10` | Idle connections kept warm |
//! | `SEQUENCER_DB_CONN_MAX_LIFETIME_SECS` | `1800` | Connection lifetime |
//! | `SEQUENCER_DB_CONNECT_ATTEMPTS` | `3` | Bootstrap connection attempts |
//! | `SEQUENCER_DB_CONNECT_RETRY_DELAY_MS` | `2000` | Delay between attempts |
//!
//! # Modules
//!
//! - [`bootstrap`]: One-time, retrying pool initialization
//! - [`config`]: Configuration loading from environment
//! - [`context`]: Per-request pool handle and request id
//! - [`dto`]: Request/response payloads and their validation
//! - [`error`]: Error types with error codes
//! - [`migrations`]: Embedded schema migrations
//! - [`models`]: Persisted rows
//! - [`store`]: Storage trait and backends
//! - [`workflow`]: Transactional use cases

#![deny(missing_docs)]

pub mod bootstrap;
pub mod config;
pub mod context;
pub mod dto;
pub mod error;
pub mod migrations;
pub mod models;
pub mod store;
pub mod workflow;

pub use bootstrap::{DatastoreBootstrap, PostgresConnector, SqliteConnector};
pub use context::RequestContext;
pub use error::{CoreError, Result};
pub use models::{Sequence, Step};
pub use store::{PostgresSequenceStore, SequenceStore, SqliteSequenceStore};
pub use workflow::SequenceWorkflow;
