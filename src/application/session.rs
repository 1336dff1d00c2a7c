// Dashboard sessions - One per token, refreshed on a timer, on demand and on panel change
use crate::application::orchestrator::{DashboardSnapshot, DashboardState, FetchOrchestrator};
use crate::domain::metrics::Panel;
use crate::domain::token::AccessToken;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify, OnceCell, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(300);

/// Refresh intervals without a request or a live subscriber before a session is dropped.
pub const IDLE_REFRESH_INTERVALS: u32 = 3;

pub struct DashboardSession {
    token: AccessToken,
    orchestrator: FetchOrchestrator,
    state: DashboardState,
    panel: watch::Sender<Option<String>>,
    panels: OnceCell<Vec<Panel>>,
    next_cycle: AtomicU64,
    in_flight: AtomicUsize,
    reschedule: Notify,
    started_at: Instant,
    // Millis since `started_at`
    last_access: AtomicU64,
}

impl DashboardSession {
    pub fn new(token: AccessToken, orchestrator: FetchOrchestrator) -> Self {
        let (panel, _rx) = watch::channel(None);
        Self {
            token,
            orchestrator,
            state: DashboardState::new(),
            panel,
            panels: OnceCell::new(),
            next_cycle: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            reschedule: Notify::new(),
            started_at: Instant::now(),
            last_access: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        self.state.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.state.subscribe()
    }

    pub fn selected_panel(&self) -> Option<String> {
        self.panel.borrow().clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn touch(&self) {
        let elapsed = self.started_at.elapsed().as_millis() as u64;
        self.last_access.fetch_max(elapsed, Ordering::SeqCst);
    }

    /// No request for `idle_after` and nobody streaming.
    pub fn is_idle(&self, idle_after: Duration) -> bool {
        let last_access = self.started_at + Duration::from_millis(self.last_access.load(Ordering::SeqCst));
        last_access.elapsed() >= idle_after && !self.state.has_subscribers()
    }

    /// Panel list, fetched once per session.
    pub async fn panels(&self) -> &[Panel] {
        self.panels
            .get_or_init(|| self.orchestrator.load_panels(&self.token))
            .await
    }

    /// Run one fetch cycle and commit it. Overlapping calls are fine: each
    /// cycle gets its own sequence number and stale commits are dropped.
    /// A rejected token is terminal and never fetched again.
    pub async fn refresh(&self) -> Arc<DashboardSnapshot> {
        let current = self.state.current();
        if current.invalid_token {
            return current;
        }

        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let panel = self.selected_panel();

        let result = {
            let _guard = InFlight::enter(&self.in_flight);
            self.orchestrator.run_cycle(&self.token, panel.as_deref()).await
        };

        if !self.state.commit(cycle, panel, result) {
            tracing::debug!("Cycle {} for {} superseded before commit", cycle, self.token);
        }
        self.state.current()
    }

    /// Re-scope the dashboard. An empty title means all panels.
    pub async fn select_panel(&self, panel: Option<String>) -> Arc<DashboardSnapshot> {
        let current = self.state.current();
        if current.invalid_token {
            return current;
        }

        let panel = panel.filter(|p| !p.trim().is_empty());
        tracing::info!("Dashboard {} switched to panel {:?}", self.token, panel);
        self.panel.send_replace(panel);
        self.reschedule.notify_one();
        self.refresh().await
    }

    /// Resolves once the first cycle has committed.
    pub async fn wait_until_loaded(&self) -> Arc<DashboardSnapshot> {
        let mut rx = self.state.subscribe();
        match rx.wait_for(|snapshot| snapshot.is_loaded()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.state.current(),
        }
    }

    /// Periodic refresh. The first tick is the initial load. Stops fetching
    /// once the backend has rejected the token and returns once the session
    /// has been idle for `idle_after`.
    pub async fn run_refresh_loop(self: Arc<Self>, period: Duration, idle_after: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.is_idle(idle_after) {
                        break;
                    }
                    if self.state.current().invalid_token {
                        continue;
                    }
                    let session = self.clone();
                    tokio::spawn(async move {
                        session.refresh().await;
                    });
                }
                _ = self.reschedule.notified() => ticker.reset(),
            }
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Live sessions keyed by token.
pub struct SessionRegistry {
    orchestrator: FetchOrchestrator,
    refresh_interval: Duration,
    sessions: Arc<RwLock<HashMap<AccessToken, Arc<DashboardSession>>>>,
}

impl SessionRegistry {
    pub fn new(orchestrator: FetchOrchestrator, refresh_interval: Duration) -> Self {
        Self {
            orchestrator,
            refresh_interval,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get_or_start(&self, token: AccessToken) -> Arc<DashboardSession> {
        if let Some(session) = self.sessions.read().await.get(&token) {
            session.touch();
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        let sessions_running = sessions.len();
        let session = sessions
            .entry(token.clone())
            .or_insert_with(|| {
                tracing::info!("Starting dashboard session for {} ({} already running)", token, sessions_running);
                let session = Arc::new(DashboardSession::new(token, self.orchestrator.clone()));
                tokio::spawn(supervise(self.sessions.clone(), session.clone(), self.refresh_interval));
                session
            })
            .clone();
        session.touch();
        session
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Drives a session's refresh loop and removes the session once it goes idle.
async fn supervise(
    sessions: Arc<RwLock<HashMap<AccessToken, Arc<DashboardSession>>>>,
    session: Arc<DashboardSession>,
    period: Duration,
) {
    let idle_after = period * IDLE_REFRESH_INTERVALS;
    loop {
        session.clone().run_refresh_loop(period, idle_after).await;

        // Re-checked under the write lock so a concurrent lookup keeps it alive
        let mut sessions = sessions.write().await;
        if session.is_idle(idle_after) {
            if sessions.get(&session.token).is_some_and(|s| Arc::ptr_eq(s, &session)) {
                sessions.remove(&session.token);
            }
            tracing::info!("Evicted idle dashboard session for {} ({} left)", session.token, sessions.len());
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::metrics_gateway::Procedure;
    use crate::application::test_support::FakeGateway;
    use serde_json::json;

    fn token() -> AccessToken {
        AccessToken::parse(Some("abc123")).unwrap()
    }

    fn session_with(gateway: Arc<FakeGateway>) -> DashboardSession {
        DashboardSession::new(token(), FetchOrchestrator::new(gateway))
    }

    #[tokio::test]
    async fn test_refresh_commits_snapshot() {
        let gateway = Arc::new(FakeGateway::healthy());
        let session = session_with(gateway);

        let snapshot = session.refresh().await;

        assert_eq!(snapshot.cycle, 1);
        assert_eq!(snapshot.kpis.as_ref().unwrap().company_name, "Acme");
        assert!(!session.is_syncing());
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_settle_on_latest_cycle() {
        let gateway = Arc::new(FakeGateway::healthy());
        let session = session_with(gateway.clone());

        tokio::join!(session.refresh(), session.refresh());

        assert_eq!(session.snapshot().cycle, 2);
        assert_eq!(gateway.calls().len(), 10);
    }

    #[tokio::test]
    async fn test_select_panel_scopes_next_cycle() {
        let gateway = Arc::new(FakeGateway::healthy());
        let session = session_with(gateway.clone());

        let snapshot = session.select_panel(Some("Vendas".to_string())).await;
        assert_eq!(snapshot.panel.as_deref(), Some("Vendas"));
        assert!(gateway.calls().iter().all(|c| c.panel.as_deref() == Some("Vendas")));

        let snapshot = session.select_panel(None).await;
        assert_eq!(snapshot.panel, None);
        assert!(gateway.calls()[5..].iter().all(|c| c.panel.is_none()));
    }

    #[tokio::test]
    async fn test_blank_panel_means_all_panels() {
        let session = session_with(Arc::new(FakeGateway::healthy()));
        session.select_panel(Some("  ".to_string())).await;
        assert_eq!(session.selected_panel(), None);
    }

    #[tokio::test]
    async fn test_panels_are_fetched_once() {
        let gateway = Arc::new(FakeGateway::healthy());
        let session = session_with(gateway.clone());

        assert_eq!(session.panels().await.len(), 2);
        assert_eq!(session.panels().await.len(), 2);
        assert_eq!(gateway.calls_to(Procedure::Panels).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_loads_then_refreshes_on_interval() {
        let gateway = Arc::new(FakeGateway::healthy());
        let registry = SessionRegistry::new(FetchOrchestrator::new(gateway.clone()), DEFAULT_REFRESH_INTERVAL);

        let session = registry.get_or_start(token()).await;
        let snapshot = session.wait_until_loaded().await;
        assert_eq!(snapshot.cycle, 1);
        assert_eq!(gateway.calls().len(), 5);

        let mut rx = session.subscribe();
        let snapshot = rx.wait_for(|s| s.cycle >= 2).await.unwrap().clone();
        assert_eq!(snapshot.cycle, 2);
        assert_eq!(gateway.calls().len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_stops_after_invalid_token() {
        let gateway = Arc::new(FakeGateway::healthy());
        gateway.respond(Procedure::Kpis, json!({ "error": "token_invalido" }));
        let registry = SessionRegistry::new(FetchOrchestrator::new(gateway.clone()), DEFAULT_REFRESH_INTERVAL);

        let session = registry.get_or_start(token()).await;
        assert!(session.wait_until_loaded().await.invalid_token);

        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL * 3).await;
        assert_eq!(gateway.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_rejected_token_is_not_refetched() {
        let gateway = Arc::new(FakeGateway::healthy());
        gateway.respond(Procedure::Kpis, json!({ "error": "token_invalido" }));
        let session = session_with(gateway.clone());

        assert!(session.refresh().await.invalid_token);
        assert_eq!(gateway.calls().len(), 5);

        assert!(session.refresh().await.invalid_token);
        assert!(session.select_panel(Some("Vendas".to_string())).await.invalid_token);
        assert_eq!(gateway.calls().len(), 5);
        assert_eq!(session.selected_panel(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panel_change_restarts_interval() {
        let gateway = Arc::new(FakeGateway::healthy());
        let registry = SessionRegistry::new(FetchOrchestrator::new(gateway.clone()), DEFAULT_REFRESH_INTERVAL);

        let session = registry.get_or_start(token()).await;
        session.wait_until_loaded().await;
        assert_eq!(gateway.calls().len(), 5);

        tokio::time::sleep(Duration::from_secs(200)).await;
        session.select_panel(Some("Vendas".to_string())).await;
        assert_eq!(gateway.calls().len(), 10);

        // t=350s: the original 300s tick was pushed back
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(gateway.calls().len(), 10);

        // t=550s: one tick at 500s
        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(gateway.calls().len(), 15);
        assert_eq!(session.snapshot().panel.as_deref(), Some("Vendas"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_is_evicted() {
        let gateway = Arc::new(FakeGateway::healthy());
        let registry = SessionRegistry::new(FetchOrchestrator::new(gateway.clone()), DEFAULT_REFRESH_INTERVAL);

        registry.get_or_start(token()).await.wait_until_loaded().await;
        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL * 6).await;
        assert_eq!(registry.len().await, 0);

        let calls = gateway.calls().len();
        assert!(calls <= 20);
        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL * 3).await;
        assert_eq!(gateway.calls().len(), calls);

        let session = registry.get_or_start(token()).await;
        assert_eq!(session.wait_until_loaded().await.cycle, 1);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accessed_session_stays_registered() {
        let registry = SessionRegistry::new(
            FetchOrchestrator::new(Arc::new(FakeGateway::healthy())),
            DEFAULT_REFRESH_INTERVAL,
        );

        let first = registry.get_or_start(token()).await;
        for _ in 0..6 {
            tokio::time::sleep(DEFAULT_REFRESH_INTERVAL).await;
            let again = registry.get_or_start(token()).await;
            assert!(Arc::ptr_eq(&first, &again));
        }
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_streaming_subscriber_keeps_session() {
        let registry = SessionRegistry::new(
            FetchOrchestrator::new(Arc::new(FakeGateway::healthy())),
            DEFAULT_REFRESH_INTERVAL,
        );

        let _rx = registry.get_or_start(token()).await.subscribe();
        tokio::time::sleep(DEFAULT_REFRESH_INTERVAL * 6).await;
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_registry_reuses_sessions() {
        let registry = SessionRegistry::new(
            FetchOrchestrator::new(Arc::new(FakeGateway::healthy())),
            DEFAULT_REFRESH_INTERVAL,
        );

        let first = registry.get_or_start(token()).await;
        let second = registry.get_or_start(token()).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }
}
