//! # Request Handler
//!
//! Answers the inbound envelope on top of the three subsystems.

use std::sync::Arc;

use br_02_cache_store::{CacheStore, KeyValueStore};
use br_03_sync_engine::{SyncEngine, SyncEngineApi, SyncOutcome};
use br_04_query_engine::{BlockingInfo, QueryEngine, QueryEngineApi};
use shared_types::{fetch_block_list, AuthToken, GraphApi};
use tracing::{debug, info, warn};

use crate::error::{codes, RuntimeError};
use crate::events::{AuthAck, Request, Response, SyncStatusView, TriggerAck};
use crate::scheduler::SyncTrigger;

/// The BlockRadar request surface.
pub struct BlockRadarService<S, G>
where
    S: KeyValueStore + 'static,
    G: GraphApi + ?Sized + 'static,
{
    store: Arc<CacheStore<S>>,
    graph: Arc<G>,
    sync: Arc<SyncEngine<S, G>>,
    query: QueryEngine<S, G>,
    trigger: SyncTrigger,
}

impl<S, G> BlockRadarService<S, G>
where
    S: KeyValueStore + 'static,
    G: GraphApi + ?Sized + 'static,
{
    pub fn new(
        store: Arc<CacheStore<S>>,
        graph: Arc<G>,
        sync: Arc<SyncEngine<S, G>>,
        query: QueryEngine<S, G>,
        trigger: SyncTrigger,
    ) -> Self {
        Self {
            store,
            graph,
            sync,
            query,
            trigger,
        }
    }

    pub fn store(&self) -> &Arc<CacheStore<S>> {
        &self.store
    }

    pub fn sync_engine(&self) -> &Arc<SyncEngine<S, G>> {
        &self.sync
    }

    /// Answer one request. Never fails; errors travel in the envelope.
    pub async fn handle(&self, request: Request) -> Response {
        let kind = request.kind();
        debug!(request = kind, "Handling request");

        let result = match request {
            Request::TriggerSync => self.trigger_sync().await.map(|o| Response::ok(&o)),
            Request::GetBlockingInfo { profile_id } => self
                .get_blocking_info(&profile_id)
                .await
                .map(|info| Response::ok(&info)),
            Request::GetSyncStatus => self.get_sync_status().map(|view| Response::ok(&view)),
            Request::ClearCache => self.clear_cache().map(|ack| Response::ok(&ack)),
            Request::SetAuth { token } => self.set_auth(&token).map(|ack| Response::ok(&ack)),
        };

        result.unwrap_or_else(|e| {
            warn!(request = kind, error = %e, code = e.code(), "Request failed");
            Response::error(&e)
        })
    }

    /// Decode a JSON request, answer it, and encode the response.
    pub async fn handle_json(&self, raw: &str) -> String {
        let response = match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => Response::Error {
                code: codes::PARSE_ERROR,
                message: format!("Malformed request: {e}"),
            },
        };
        serde_json::to_string(&response).unwrap_or_else(|e| {
            format!(
                r#"{{"type":"error","code":{},"message":"Failed to encode response: {}"}}"#,
                codes::INTERNAL_ERROR,
                e
            )
        })
    }

    /// Run a pass now.
    pub async fn trigger_sync(&self) -> Result<SyncOutcome, RuntimeError> {
        Ok(self.sync.run_sync().await?)
    }

    /// Block relationships with `profile_id`.
    ///
    /// The viewed account's own block list is fetched live; if that fails,
    /// `blocking` is answered empty.
    pub async fn get_blocking_info(&self, profile_id: &str) -> Result<BlockingInfo, RuntimeError> {
        if profile_id.is_empty() {
            return Err(RuntimeError::InvalidRequest(
                "profileId must not be empty".to_string(),
            ));
        }
        if self.store.auth()?.is_none() {
            debug!(profile = %profile_id, "Not authenticated, answering empty");
            return Ok(BlockingInfo::default());
        }

        let profile_blocks = match fetch_block_list(self.graph.as_ref(), profile_id).await {
            Ok(blocks) => blocks,
            Err(e) => {
                warn!(profile = %profile_id, error = %e, "Could not fetch viewed profile's blocks");
                Vec::new()
            }
        };

        Ok(self
            .query
            .lookup_blocking_info(profile_id, &profile_blocks)
            .await?)
    }

    pub fn get_sync_status(&self) -> Result<SyncStatusView, RuntimeError> {
        Ok(SyncStatusView {
            status: self.store.status()?,
            cache: self.store.stats()?,
            phase: self.sync.phase(),
            sync_metrics: SyncEngineApi::metrics(self.sync.as_ref()),
            query_metrics: QueryEngineApi::metrics(&self.query),
        })
    }

    /// Drop the status and cache, then queue a fresh pass.
    pub fn clear_cache(&self) -> Result<TriggerAck, RuntimeError> {
        self.store.reset_status()?;
        self.store.clear_cache()?;
        info!("Cache cleared");
        Ok(TriggerAck {
            queued: self.trigger.fire(),
        })
    }

    /// Store `token`.
    ///
    /// A token for another identity than the stored one drops that
    /// identity's cache and status. The first token, or a new identity,
    /// queues a pass.
    pub fn set_auth(&self, token: &AuthToken) -> Result<AuthAck, RuntimeError> {
        if token.owner_id.is_empty() {
            return Err(RuntimeError::InvalidRequest(
                "token.ownerId must not be empty".to_string(),
            ));
        }

        let previous = self.store.auth()?;
        let identity_changed = previous
            .as_ref()
            .is_some_and(|p| p.owner_id != token.owner_id);

        if identity_changed {
            info!(owner = %token.owner_id, "Identity changed, dropping previous cache");
            self.store.clear_cache()?;
            self.store.reset_status()?;
        }
        self.store.set_auth(token)?;

        let sync_queued = if previous.is_none() || identity_changed {
            self.trigger.fire()
        } else {
            false
        };
        info!(owner = %token.owner_id, handle = %token.handle, sync_queued, "Auth stored");

        Ok(AuthAck {
            identity_changed,
            sync_queued,
        })
    }
}
