//! # Sync and Lookup Scenarios
//!
//! End-to-end behaviour of a pass followed by lookups:
//!
//! 1. **Lookups**: exact profile, blocking direction, empty cache
//! 2. **Failures**: partial fetch failure, enumeration failure
//! 3. **Lease**: live holder skipped, stale holder reclaimed
//! 4. **Quota**: eviction keeps the cache under the soft quota
//! 5. **Probabilistic profile**: candidates verified against the graph

use std::time::Duration;

use anyhow::Result;
use br_02_cache_store::{BlockSet, StatusUpdate, StorageConfig};
use br_03_sync_engine::{SkipReason, SyncConfig, SyncEngine, SyncOutcome};
use br_04_query_engine::QueryEngineApi;
use proptest::prelude::*;
use shared_types::{FollowedUser, StorageProfile};

use super::harness::{dids, Harness, OWNER};

// =============================================================================
// LOOKUPS
// =============================================================================

#[tokio::test]
async fn test_exact_profile_lookup() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    let users = h.follow(2, |i| if i == 0 { vec!["did:plc:p1".into()] } else { vec![] });
    h.sync_completed().await?;

    let info = h.lookup("did:plc:p1").await?;

    assert_eq!(info.blocked_by, vec![users[0].clone()]);
    assert!(info.blocking.is_empty());
    assert!(info.last_full_sync_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_blocking_direction() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    let users = h.follow(3, |_| vec![]);
    h.graph.set_blocks("did:plc:target", [users[2].did.clone()]);
    h.sync_completed().await?;

    let info = h.lookup("did:plc:target").await?;

    assert!(info.blocked_by.is_empty());
    assert_eq!(info.blocking, vec![users[2].clone()]);
    Ok(())
}

#[tokio::test]
async fn test_empty_cache_lookup() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;

    let info = h.lookup("did:plc:anyone").await?;

    assert!(info.blocked_by.is_empty());
    assert!(info.blocking.is_empty());
    assert_eq!(h.query.metrics().empty_cache_lookups, 1);
    Ok(())
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn test_partial_fetch_failure() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    let users = h.follow(10, |i| vec![format!("did:plc:blocked{i}")]);
    h.graph.fail_blocks_for(&users[2].did);
    h.graph.fail_blocks_for(&users[7].did);

    let report = h.sync_completed().await?;

    assert_eq!(report.errors.len(), 2);
    let status = h.store.status()?;
    assert_eq!(status.errors.len(), 2);
    assert!(!status.running);

    let cache = h.store.load_cache()?.expect("cache persisted");
    let failed = [users[2].did.as_str(), users[7].did.as_str()];
    for did in dids(&users) {
        assert_eq!(cache.block_sets.contains_key(did), !failed.contains(&did), "{did}");
    }
    Ok(())
}

#[tokio::test]
async fn test_enumeration_failure_leaves_previous_cache() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    h.follow(2, |_| vec!["did:plc:p".into()]);
    h.sync_completed().await?;

    h.graph.set_fail_follows(true);
    assert!(h.sync.run_sync().await.is_err());

    let status = h.store.status()?;
    assert!(!status.running);
    assert_eq!(status.errors.len(), 1);
    assert_eq!(h.lookup("did:plc:p").await?.blocked_by.len(), 2);

    h.graph.set_fail_follows(false);
    let report = h.sync_completed().await?;
    assert!(report.errors.is_empty());
    Ok(())
}

// =============================================================================
// IDEMPOTENCE
// =============================================================================

#[tokio::test]
async fn test_resync_gives_identical_answers() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    let users = h.follow(6, |i| (0..i).map(|j| format!("did:plc:p{j}")).collect());
    h.graph.set_blocks("did:plc:p1", [users[0].did.clone(), users[4].did.clone()]);

    h.sync_completed().await?;
    let before = h.lookup("did:plc:p1").await?;
    h.clock.advance(Duration::from_secs(60));
    h.sync_completed().await?;
    let after = h.lookup("did:plc:p1").await?;

    assert_eq!(before.blocked_by, after.blocked_by);
    assert_eq!(before.blocking, after.blocking);
    assert_eq!(after.blocked_by.len(), 4);
    Ok(())
}

fn stored_entries(h: &Harness) -> Result<Vec<String>> {
    Ok(h.store
        .load_cache()?
        .map(|c| c.block_sets.into_keys().collect())
        .unwrap_or_default())
}

fn resync_is_stable(block_counts: Vec<usize>) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(async {
        let h = Harness::new()?;
        h.login()?;
        h.follow(block_counts.len(), |i| {
            (0..block_counts[i]).map(|j| format!("did:plc:p{j}")).collect()
        });

        h.sync_completed().await?;
        let first = stored_entries(&h)?;
        let answer = h.lookup("did:plc:p0").await?;

        h.sync_completed().await?;
        let second = stored_entries(&h)?;

        anyhow::ensure!(first == second, "stored entries changed between passes");
        anyhow::ensure!(
            answer.blocked_by == h.lookup("did:plc:p0").await?.blocked_by,
            "answers changed between passes"
        );
        Ok::<(), anyhow::Error>(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_resync_is_idempotent(block_counts in prop::collection::vec(0usize..4, 0..12)) {
        prop_assert!(resync_is_stable(block_counts).is_ok());
    }
}

// =============================================================================
// LEASE
// =============================================================================

#[tokio::test]
async fn test_live_lease_skips_pass() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    h.follow(2, |_| vec![]);
    h.store.update_status(StatusUpdate::default().with_running(true))?;
    h.clock.advance(Duration::from_secs(60));

    let outcome = h.sync.run_sync().await?;

    assert!(matches!(
        outcome,
        SyncOutcome::Skipped(SkipReason::AlreadyRunning { heartbeat_age_ms: 60_000 })
    ));
    assert!(h.store.load_cache()?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_stale_lock_recovery() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    h.follow(3, |_| vec!["did:plc:p".into()]);
    h.store.update_status(StatusUpdate::default().with_running(true))?;
    h.clock.advance(Duration::from_secs(5 * 60 + 1));

    let report = h.sync_completed().await?;

    assert!(report.reclaimed_stale_lock);
    assert_eq!(report.synced_follows, 3);
    assert!(!h.store.status()?.running);
    Ok(())
}

// =============================================================================
// QUOTA
// =============================================================================

#[tokio::test]
async fn test_quota_eviction_keeps_cache_under_quota() -> Result<()> {
    let storage = StorageConfig::for_testing()
        .with_quota(4_000)
        .with_hard_limit(8_000);
    let h = Harness::with_configs(storage, SyncConfig::for_testing())?;
    h.login()?;
    h.follow(10, |i| {
        (0..30).map(|j| format!("did:plc:blocked-{i:02}-{j:03}")).collect()
    });

    let report = h.sync_completed().await?;

    assert!(report.entries_evicted > 0);
    let stats = h.store.stats()?;
    assert!(stats.serialized_bytes < 4_000, "{} bytes", stats.serialized_bytes);
    assert_eq!(stats.followed, 10);
    assert_eq!(stats.entries + report.entries_evicted, 10);
    Ok(())
}

// =============================================================================
// PROBABILISTIC PROFILE
// =============================================================================

#[tokio::test]
async fn test_probabilistic_lookup_verifies_candidates() -> Result<()> {
    let config = SyncConfig::for_testing().with_profile(StorageProfile::Probabilistic);
    let h = Harness::with_configs(StorageConfig::for_testing(), config)?;
    h.login()?;
    let users = h.follow(4, |i| {
        if i % 2 == 0 {
            vec!["did:plc:p1".into(), format!("did:plc:other{i}")]
        } else {
            vec![format!("did:plc:other{i}")]
        }
    });
    h.sync_completed().await?;

    let cache = h.store.load_cache()?.expect("cache persisted");
    assert!(cache
        .block_sets
        .values()
        .all(|set| matches!(set, BlockSet::Probabilistic { .. })));

    let info = h.lookup("did:plc:p1").await?;

    let expected: Vec<FollowedUser> = vec![users[0].clone(), users[2].clone()];
    assert_eq!(info.blocked_by, expected);
    let metrics = h.query.metrics();
    assert!(metrics.candidates >= 2);
    assert_eq!(metrics.confirmed, 2);
    assert_eq!(metrics.candidates, metrics.confirmed + metrics.false_positives);
    Ok(())
}

#[tokio::test]
async fn test_profile_switch_rebuilds_cache() -> Result<()> {
    let h = Harness::new()?;
    h.login()?;
    h.follow(2, |_| vec!["did:plc:p".into()]);
    h.sync_completed().await?;

    let config = SyncConfig::for_testing().with_profile(StorageProfile::Probabilistic);
    let probabilistic = SyncEngine::new(h.store.clone(), h.graph.clone(), config)?;
    let outcome = probabilistic.run_sync().await?;
    let report = outcome.report().expect("pass completed");

    assert!(report.first_sync);
    let cache = h.store.load_cache()?.expect("cache persisted");
    assert_eq!(cache.owner_id, OWNER);
    assert_eq!(cache.profile, StorageProfile::Probabilistic);
    Ok(())
}
