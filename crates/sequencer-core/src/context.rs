// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-request handle passed explicitly into every workflow call.

use sqlx::{Database, Pool, Transaction};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Borrowed pool plus the request id used to tag log spans.
///
/// The pool must be the one the workflow's store reads from; transactions
/// begun here and the store's own reads are expected to see the same database.
#[derive(Debug)]
pub struct RequestContext<'a, DB: Database> {
    db: &'a Pool<DB>,
    request_id: String,
}

impl<'a, DB: Database> RequestContext<'a, DB> {
    /// Context with a freshly generated request id.
    pub fn new(db: &'a Pool<DB>) -> Self {
        Self::with_request_id(db, Uuid::new_v4().to_string())
    }

    /// Context carrying an id supplied by the caller (e.g. an inbound header).
    pub fn with_request_id(db: &'a Pool<DB>, request_id: impl Into<String>) -> Self {
        Self {
            db,
            request_id: request_id.into(),
        }
    }

    /// Id attached to every log line of this request.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The shared pool.
    pub fn db(&self) -> &'a Pool<DB> {
        self.db
    }

    /// Begin a transaction on the shared pool.
    pub async fn begin(&self) -> Result<Transaction<'static, DB>> {
        self.db
            .begin()
            .await
            .map_err(|e| CoreError::persistence("begin", e))
    }
}
