//! # Runtime Flows
//!
//! The request envelope over a running instance, and state that has to
//! survive a process restart.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use br_02_cache_store::{FileKVStore, KeyValueStore, StatusUpdate, StorageConfig};
use br_03_sync_engine::SyncConfig;
use br_runtime::{codes, BlockRadarRuntime, Response, RuntimeConfig};
use serde_json::json;
use shared_types::{FollowedUser, InMemoryGraph};

use super::harness::{Harness, OWNER};

fn graph() -> Arc<InMemoryGraph> {
    let graph = Arc::new(InMemoryGraph::new());
    graph.set_follows(
        OWNER,
        vec![
            FollowedUser::new("did:plc:a", "a.test"),
            FollowedUser::new("did:plc:b", "b.test"),
        ],
    );
    graph.set_blocks("did:plc:a", ["did:plc:viewed"]);
    graph.set_blocks("did:plc:viewed", ["did:plc:b"]);
    graph
}

fn file_harness(dir: &Path, graph: Arc<InMemoryGraph>) -> Result<Harness<FileKVStore>> {
    let storage = StorageConfig::for_testing();
    let kv = FileKVStore::open(dir, Some(storage.hard_limit_bytes))?;
    Harness::over(kv, storage, SyncConfig::for_testing(), graph)
}

async fn call<S: KeyValueStore + 'static>(
    runtime: &BlockRadarRuntime<S, InMemoryGraph>,
    request: serde_json::Value,
) -> Result<Response> {
    let raw = runtime.service().handle_json(&request.to_string()).await;
    Ok(serde_json::from_str(&raw)?)
}

#[tokio::test]
async fn test_json_envelope_flow() -> Result<()> {
    let config = RuntimeConfig::builder()
        .storage(StorageConfig::for_testing())
        .sync(SyncConfig::for_testing())
        .sync_on_startup(false)
        .build()?;
    let runtime = BlockRadarRuntime::in_memory(&config, graph())?;

    let auth = call(
        &runtime,
        json!({
            "type": "setAuth",
            "token": {
                "accessToken": "tok",
                "ownerId": OWNER,
                "handle": "owner.test",
                "apiBaseUrl": "https://pds.test"
            }
        }),
    )
    .await?;
    assert!(auth.is_ok());

    let sync = call(&runtime, json!({"type": "triggerSync"})).await?;
    assert!(sync.is_ok());

    let info = call(
        &runtime,
        json!({"type": "getBlockingInfo", "profileId": "did:plc:viewed"}),
    )
    .await?;
    let Response::Ok { data } = info else {
        anyhow::bail!("lookup failed: {info:?}");
    };
    assert_eq!(data["blockedBy"][0]["did"], "did:plc:a");
    assert_eq!(data["blocking"][0]["did"], "did:plc:b");

    let status = call(&runtime, json!({"type": "getSyncStatus"})).await?;
    let Response::Ok { data } = status else {
        anyhow::bail!("status failed: {status:?}");
    };
    assert_eq!(data["status"]["syncedFollows"], 2);

    let bad = call(&runtime, json!({"type": "getBlockingInfo", "profileId": ""})).await?;
    assert_eq!(bad.error_code(), Some(codes::INVALID_REQUEST));

    runtime.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_cache_survives_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;

    {
        let h = file_harness(dir.path(), graph())?;
        h.login()?;
        h.sync_completed().await?;
    }

    // Lookups answer from disk without another pass.
    let graph = graph();
    let h = file_harness(dir.path(), graph.clone())?;
    let info = h.lookup("did:plc:viewed").await?;

    assert_eq!(info.blocked_by, vec![FollowedUser::new("did:plc:a", "a.test")]);
    assert_eq!(graph.follow_page_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_crashed_pass_recovered_after_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;

    {
        let h = file_harness(dir.path(), graph())?;
        h.login()?;
        // The process dies holding the lease.
        h.store.update_status(StatusUpdate::default().with_running(true))?;
    }

    let h = file_harness(dir.path(), graph())?;
    assert!(h.sync.run_sync().await?.is_skipped());

    h.clock.advance(Duration::from_secs(6 * 60));
    let report = h.sync_completed().await?;

    assert!(report.reclaimed_stale_lock);
    assert_eq!(report.synced_follows, 2);
    assert!(!h.store.status()?.running);
    Ok(())
}
