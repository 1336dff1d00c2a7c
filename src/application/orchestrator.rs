// Fetch orchestrator - Fan-out of the five metric procedures and the state commit
use crate::application::metrics_gateway::{MetricsGateway, Procedure};
use crate::application::normalizer::normalize;
use crate::application::view_model::{
    build_evolution, build_funnel, build_kpis, build_overdue, build_panels, build_ranking, KpiOutcome,
};
use crate::domain::metrics::{EvolutionPoint, FunnelStage, KpiSnapshot, OverdueItem, Panel, RankingRow};
use crate::domain::token::AccessToken;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Outcome of one fetch cycle. `None` means the call failed this cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleResult {
    pub kpis: Option<KpiSnapshot>,
    pub funnel: Option<Vec<FunnelStage>>,
    pub evolution: Option<Vec<EvolutionPoint>>,
    pub ranking: Option<Vec<RankingRow>>,
    pub overdue: Option<Vec<OverdueItem>>,
    pub errors: Vec<String>,
    pub invalid_token: bool,
}

impl CycleResult {
    fn invalid_token() -> Self {
        Self {
            invalid_token: true,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct FetchOrchestrator {
    gateway: Arc<dyn MetricsGateway>,
}

impl FetchOrchestrator {
    pub fn new(gateway: Arc<dyn MetricsGateway>) -> Self {
        Self { gateway }
    }

    pub async fn load_panels(&self, token: &AccessToken) -> Vec<Panel> {
        let procedure = Procedure::Panels;
        let raw = self.gateway.call(procedure, token, None).await;
        build_panels(normalize(raw, procedure.name()))
    }

    /// Run the five metric calls concurrently and build the view models
    /// once all of them have settled.
    pub async fn run_cycle(&self, token: &AccessToken, panel: Option<&str>) -> CycleResult {
        let start_time = Instant::now();
        let fetch = |procedure: Procedure| async move {
            let raw = self.gateway.call(procedure, token, panel).await;
            normalize(raw, procedure.name())
        };

        let (kpis, funnel, evolution, ranking, overdue) = tokio::join!(
            fetch(Procedure::Kpis),
            fetch(Procedure::Funnel),
            fetch(Procedure::Evolution),
            fetch(Procedure::Ranking),
            fetch(Procedure::Overdue),
        );

        let mut errors = Vec::new();
        let kpis = match build_kpis(kpis) {
            KpiOutcome::InvalidToken => {
                tracing::warn!("Backend rejected dashboard token {}", token);
                return CycleResult::invalid_token();
            }
            KpiOutcome::Snapshot(snapshot) => Some(snapshot),
            KpiOutcome::Unavailable => {
                errors.push(Procedure::Kpis.label().to_string());
                None
            }
        };

        let funnel = build_funnel(funnel);
        if funnel.is_none() {
            errors.push(Procedure::Funnel.label().to_string());
        }
        let evolution = build_evolution(evolution);
        if evolution.is_none() {
            errors.push(Procedure::Evolution.label().to_string());
        }
        let ranking = build_ranking(ranking);
        if ranking.is_none() {
            errors.push(Procedure::Ranking.label().to_string());
        }
        // Least critical metric: a failure reads as "nothing overdue".
        let overdue = Some(build_overdue(overdue).unwrap_or_default());

        tracing::debug!(
            "Fetch cycle for {} (panel {:?}) finished in {:?} with {} failed metrics",
            token,
            panel,
            start_time.elapsed(),
            errors.len()
        );

        CycleResult {
            kpis,
            funnel,
            evolution,
            ranking,
            overdue,
            errors,
            invalid_token: false,
        }
    }
}

/// The current view-model state of one dashboard session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    /// Sequence number of the cycle that produced this snapshot, 0 before the first commit.
    pub cycle: u64,
    pub panel: Option<String>,
    pub kpis: Option<KpiSnapshot>,
    pub funnel: Option<Vec<FunnelStage>>,
    pub evolution: Option<Vec<EvolutionPoint>>,
    pub ranking: Option<Vec<RankingRow>>,
    pub overdue: Option<Vec<OverdueItem>>,
    pub errors: Vec<String>,
    pub invalid_token: bool,
    pub last_sync: Option<DateTime<Local>>,
}

impl DashboardSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.cycle > 0 || self.invalid_token
    }

    // Failed entities keep their previous value.
    fn apply(&self, cycle: u64, panel: Option<String>, result: CycleResult) -> Self {
        if result.invalid_token {
            return Self {
                cycle,
                invalid_token: true,
                ..self.clone()
            };
        }

        Self {
            cycle,
            panel,
            kpis: result.kpis.or_else(|| self.kpis.clone()),
            funnel: result.funnel.or_else(|| self.funnel.clone()),
            evolution: result.evolution.or_else(|| self.evolution.clone()),
            ranking: result.ranking.or_else(|| self.ranking.clone()),
            overdue: result.overdue.or_else(|| self.overdue.clone()),
            errors: result.errors,
            invalid_token: false,
            last_sync: Some(Local::now()),
        }
    }
}

/// Single-writer snapshot container. Readers get an immutable `Arc`
/// and may subscribe to every commit.
pub struct DashboardState {
    tx: watch::Sender<Arc<DashboardSnapshot>>,
}

impl DashboardState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(DashboardSnapshot::default()));
        Self { tx }
    }

    pub fn current(&self) -> Arc<DashboardSnapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardSnapshot>> {
        self.tx.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        self.tx.receiver_count() > 0
    }

    /// Replace the snapshot with `result` applied on top of it. A commit from
    /// a cycle that started before the one already committed is dropped.
    /// Returns whether the commit was applied.
    pub fn commit(&self, cycle: u64, panel: Option<String>, result: CycleResult) -> bool {
        self.tx.send_if_modified(move |current| {
            if cycle <= current.cycle {
                tracing::debug!("Discarding stale cycle {} (current {})", cycle, current.cycle);
                return false;
            }
            *current = Arc::new(current.apply(cycle, panel, result));
            true
        })
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}
