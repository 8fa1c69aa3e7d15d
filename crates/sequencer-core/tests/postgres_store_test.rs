// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! PostgreSQL store and workflow tests. Skipped unless TEST_DATABASE_URL is set.

mod common;

use common::*;
use std::time::Duration;
use uuid::Uuid;

use sequencer_core::bootstrap::{DatastoreBootstrap, PostgresConnector, PoolSettings, RetryPolicy};
use sequencer_core::dto::UpdateStepRequest;
use sequencer_core::store::{PostgresSequenceStore, SequenceStore};
use sequencer_core::{RequestContext, SequenceWorkflow};

#[tokio::test]
async fn test_bootstrap_connects_once() {
    skip_if_no_db!();

    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        return;
    };
    let bootstrap = DatastoreBootstrap::new(
        PostgresConnector::new(url),
        PoolSettings {
            max_connections: 5,
            min_connections: 1,
            ..Default::default()
        },
        RetryPolicy {
            max_attempts: 1,
            delay: Duration::from_millis(10),
        },
    );

    let a = bootstrap.init_client().await.expect("bootstrap should connect");
    let b = bootstrap.init_client().await.unwrap();
    assert!(bootstrap.is_initialized());

    let (x,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(&a).await.unwrap();
    assert_eq!(x, 1);
    drop(b);

    bootstrap.shutdown().await;
    assert!(a.is_closed());
}

#[tokio::test]
async fn test_postgres_create_get_and_order() {
    skip_if_no_db!();

    let Some(pool) = postgres_pool().await else {
        eprintln!("Skipping test: failed to connect to TEST_DATABASE_URL");
        return;
    };
    let workflow = SequenceWorkflow::new(PostgresSequenceStore::new(pool.clone()));
    let ctx = RequestContext::new(&pool);

    let response = workflow
        .create_sequence(
            &ctx,
            create_request(
                "Postgres onboarding",
                vec![step(2, "Second", "b", 3), step(1, "First", "a", 0)],
            ),
        )
        .await
        .unwrap();
    let id = Uuid::parse_str(&response.id).unwrap();

    let sequence = workflow.get_sequence(&ctx, id).await.unwrap();
    let orders: Vec<i32> = sequence.steps.iter().map(|s| s.step_order).collect();
    assert_eq!(orders, vec![1, 2]);
    assert!(sequence.open_tracking_enabled);
}

#[tokio::test]
async fn test_postgres_constraint_violation_rolls_back() {
    skip_if_no_db!();

    let Some(pool) = postgres_pool().await else {
        eprintln!("Skipping test: failed to connect to TEST_DATABASE_URL");
        return;
    };
    let workflow = SequenceWorkflow::new(PostgresSequenceStore::new(pool.clone()));
    let ctx = RequestContext::new(&pool);
    let name = format!("rollback-{}", Uuid::new_v4());

    let err = workflow
        .create_sequence(
            &ctx,
            create_request(&name, vec![step(1, "ok", "a", 0), step(2, "ok", "b", -1)]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PERSISTENCE_ERROR");

    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sequences WHERE name = $1")
        .bind(&name)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_postgres_patch_and_delete() {
    skip_if_no_db!();

    let Some(pool) = postgres_pool().await else {
        eprintln!("Skipping test: failed to connect to TEST_DATABASE_URL");
        return;
    };
    let workflow = SequenceWorkflow::new(PostgresSequenceStore::new(pool.clone()));
    let ctx = RequestContext::new(&pool);

    let response = workflow
        .create_sequence(
            &ctx,
            create_request("Patch", vec![step(1, "A", "X", 0), step(2, "C", "Z", 1)]),
        )
        .await
        .unwrap();
    let sequence_id = Uuid::parse_str(&response.id).unwrap();
    let steps = workflow.get_sequence(&ctx, sequence_id).await.unwrap().steps;

    workflow
        .update_step(
            &ctx,
            sequence_id,
            steps[0].id,
            UpdateStepRequest {
                subject: None,
                content: Some("Y".to_string()),
            },
        )
        .await
        .unwrap();
    let patched = workflow
        .store()
        .get_step_by_id(sequence_id, steps[0].id)
        .await
        .unwrap();
    assert_eq!(patched.subject, "A");
    assert_eq!(patched.content, "Y");

    workflow
        .delete_step(&ctx, sequence_id, steps[1].id)
        .await
        .unwrap();
    workflow
        .delete_step(&ctx, sequence_id, Uuid::new_v4())
        .await
        .unwrap();

    let remaining = workflow.get_sequence(&ctx, sequence_id).await.unwrap().steps;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, steps[0].id);
}

#[tokio::test]
async fn test_postgres_stale_step_upsert_keeps_step_deleted() {
    skip_if_no_db!();

    let Some(pool) = postgres_pool().await else {
        eprintln!("Skipping test: failed to connect to TEST_DATABASE_URL");
        return;
    };
    let store = PostgresSequenceStore::new(pool.clone());
    let workflow = SequenceWorkflow::new(store.clone());
    let ctx = RequestContext::new(&pool);

    let response = workflow
        .create_sequence(&ctx, create_request("Stale", vec![step(1, "a", "x", 0)]))
        .await
        .unwrap();
    let sequence_id = Uuid::parse_str(&response.id).unwrap();
    let mut stale = store.get_sequence(sequence_id).await.unwrap().steps[0].clone();

    workflow
        .delete_step(&ctx, sequence_id, stale.id)
        .await
        .unwrap();

    stale.subject = "edited".to_string();
    let mut tx = pool.begin().await.unwrap();
    store.update_step(&mut tx, &stale).await.unwrap();
    tx.commit().await.unwrap();

    assert!(store.get_sequence(sequence_id).await.unwrap().steps.is_empty());
    assert!(store.get_step_by_id(sequence_id, stale.id).await.is_err());
}
