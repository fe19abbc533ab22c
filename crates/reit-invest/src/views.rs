//! Cached listing views with stale-time, invalidation and background refresh

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::chain::ChainRpc;
use crate::config::RefreshPolicy;
use crate::errors::LedgerError;
use crate::ledger::{InvestmentFilter, Ledger};
use crate::projector::{InvestmentView, ReitView, StatusProjector};
use crate::session::Session;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Reits,
    Investments {
        filter: InvestmentFilter,
        with_users: bool,
    },
}

/// Coarse grouping used by invalidation after a write
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Reits,
    Investments,
}

impl QueryKey {
    pub fn kind(&self) -> ViewKind {
        match self {
            QueryKey::Reits => ViewKind::Reits,
            QueryKey::Investments { .. } => ViewKind::Investments,
        }
    }

    /// Listing scope of a session; `None` for anonymous visitors
    pub fn investments_for(session: &Session) -> Option<Self> {
        session.investment_scope().map(|filter| QueryKey::Investments {
            filter,
            with_users: session.is_admin(),
        })
    }
}

#[derive(Clone, Debug)]
pub enum View {
    Reits(Arc<Vec<ReitView>>),
    Investments(Arc<Vec<InvestmentView>>),
}

struct Entry {
    view: View,
    fetched_at: Instant,
    invalidated: bool,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<QueryKey, Entry>,
    /// Bumped on every invalidation of a kind, including ones that arrive
    /// while a refresh of that kind is still projecting
    generations: HashMap<ViewKind, u64>,
}

impl CacheState {
    fn bump(&mut self, kind: ViewKind) {
        *self.generations.entry(kind).or_default() += 1;
    }

    fn generation(&self, kind: ViewKind) -> u64 {
        self.generations.get(&kind).copied().unwrap_or_default()
    }
}

/// Shared between the orchestrator (invalidates) and the view service (reads)
#[derive(Default)]
pub struct ViewCache {
    state: Mutex<CacheState>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&self, kind: ViewKind) {
        if let Ok(mut state) = self.state.lock() {
            state.bump(kind);
            let mut count = 0;
            for (_, entry) in state.entries.iter_mut().filter(|(k, _)| k.kind() == kind) {
                entry.invalidated = true;
                count += 1;
            }
            debug!(?kind, count, "Invalidated views");
        }
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.bump(ViewKind::Reits);
            state.bump(ViewKind::Investments);
            state.entries.values_mut().for_each(|e| e.invalidated = true);
        }
    }

    pub fn is_stale(&self, key: &QueryKey, stale_after: std::time::Duration) -> bool {
        match self.state.lock() {
            Ok(state) => state
                .entries
                .get(key)
                .map_or(true, |e| e.invalidated || e.fetched_at.elapsed() >= stale_after),
            Err(_) => true,
        }
    }

    fn fresh(&self, key: &QueryKey, stale_after: std::time::Duration) -> Option<View> {
        let state = self.state.lock().ok()?;
        state
            .entries
            .get(key)
            .filter(|e| !e.invalidated && e.fetched_at.elapsed() < stale_after)
            .map(|e| e.view.clone())
    }

    /// Invalidation generation of `kind`; read before projecting and hand
    /// back to [`ViewCache::store`]
    fn generation(&self, kind: ViewKind) -> u64 {
        self.state
            .lock()
            .map(|state| state.generation(kind))
            .unwrap_or_default()
    }

    /// A view projected under an older generation is kept but marked
    /// invalidated, so the next read re-projects
    fn store(&self, key: QueryKey, view: View, generation: u64) {
        if let Ok(mut state) = self.state.lock() {
            let invalidated = state.generation(key.kind()) != generation;
            if invalidated {
                debug!(?key, "Write landed during refresh; view stored as stale");
            }
            state.entries.insert(
                key,
                Entry {
                    view,
                    fetched_at: Instant::now(),
                    invalidated,
                },
            );
        }
    }

    fn keys(&self) -> Vec<QueryKey> {
        self.state
            .lock()
            .map(|state| state.entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Serves projected views from cache, re-projecting when stale
pub struct ViewService {
    cache: Arc<ViewCache>,
    policy: RefreshPolicy,
}

impl ViewService {
    pub fn new(cache: Arc<ViewCache>, policy: RefreshPolicy) -> Self {
        Self { cache, policy }
    }

    pub fn cache(&self) -> &Arc<ViewCache> {
        &self.cache
    }

    pub async fn reits<R: ChainRpc, L: Ledger>(
        &self,
        projector: &StatusProjector<'_, R, L>,
    ) -> Result<Arc<Vec<ReitView>>, LedgerError> {
        if let Some(View::Reits(view)) = self.cache.fresh(&QueryKey::Reits, self.policy.stale_after) {
            return Ok(view);
        }
        self.refresh(projector, QueryKey::Reits).await.map(|view| match view {
            View::Reits(view) => view,
            View::Investments(_) => Arc::new(Vec::new()),
        })
    }

    /// Scoped by session: admins get every investment with user details,
    /// investors their own, anonymous visitors nothing
    pub async fn investments<R: ChainRpc, L: Ledger>(
        &self,
        projector: &StatusProjector<'_, R, L>,
        session: &Session,
    ) -> Result<Arc<Vec<InvestmentView>>, LedgerError> {
        let Some(key) = QueryKey::investments_for(session) else {
            return Ok(Arc::new(Vec::new()));
        };
        if let Some(View::Investments(view)) = self.cache.fresh(&key, self.policy.stale_after) {
            return Ok(view);
        }
        self.refresh(projector, key).await.map(|view| match view {
            View::Investments(view) => view,
            View::Reits(_) => Arc::new(Vec::new()),
        })
    }

    async fn refresh<R: ChainRpc, L: Ledger>(
        &self,
        projector: &StatusProjector<'_, R, L>,
        key: QueryKey,
    ) -> Result<View, LedgerError> {
        let generation = self.cache.generation(key.kind());
        let view = match &key {
            QueryKey::Reits => View::Reits(Arc::new(projector.project_reits().await?)),
            QueryKey::Investments { filter, with_users } => View::Investments(Arc::new(
                projector.project_investments(filter, *with_users).await?,
            )),
        };
        self.cache.store(key, view.clone(), generation);
        Ok(view)
    }

    /// Re-project every cached view each `interval` until `shutdown` flips to
    /// true or its sender is dropped. Returns the number of completed cycles.
    pub async fn poll<R: ChainRpc, L: Ledger>(
        &self,
        projector: &StatusProjector<'_, R, L>,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64 {
        let mut ticker = tokio::time::interval(self.policy.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; views were just served
        ticker.tick().await;

        let mut cycles = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for key in self.cache.keys() {
                        if let Err(e) = self.refresh(projector, key.clone()).await {
                            warn!(?key, error = %e, "Background refresh failed");
                        }
                    }
                    cycles += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(cycles, "View polling stopped");
                        return cycles;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const STALE_AFTER: Duration = Duration::from_secs(60);

    fn empty_reits() -> View {
        View::Reits(Arc::new(Vec::new()))
    }

    #[test]
    fn test_store_under_current_generation_is_fresh() {
        let cache = ViewCache::new();
        let generation = cache.generation(ViewKind::Reits);
        cache.store(QueryKey::Reits, empty_reits(), generation);

        assert!(!cache.is_stale(&QueryKey::Reits, STALE_AFTER));
        assert!(cache.fresh(&QueryKey::Reits, STALE_AFTER).is_some());
    }

    #[test]
    fn test_invalidation_during_refresh_marks_result_stale() {
        let cache = ViewCache::new();
        let generation = cache.generation(ViewKind::Reits);

        // a write lands between reading the generation and storing the view
        cache.invalidate(ViewKind::Reits);
        cache.store(QueryKey::Reits, empty_reits(), generation);

        assert!(cache.is_stale(&QueryKey::Reits, STALE_AFTER));
        assert!(cache.fresh(&QueryKey::Reits, STALE_AFTER).is_none());
    }

    #[test]
    fn test_invalidation_of_other_kind_does_not_affect_store() {
        let cache = ViewCache::new();
        let generation = cache.generation(ViewKind::Reits);

        cache.invalidate(ViewKind::Investments);
        cache.store(QueryKey::Reits, empty_reits(), generation);
        assert!(!cache.is_stale(&QueryKey::Reits, STALE_AFTER));

        cache.invalidate_all();
        assert!(cache.is_stale(&QueryKey::Reits, STALE_AFTER));
    }
}
