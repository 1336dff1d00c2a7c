// Pipeline metric view models, rebuilt from scratch on every fetch cycle
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSnapshot {
    pub company_name: String,
    pub active: i64,
    pub pipeline_value: f64,
    pub overdue: i64,
    pub average_ticket: f64,
    pub won: i64,
    pub lost: i64,
    pub revenue: f64,
    /// Percent, 0-100.
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub stage: String,
    pub position: i64,
    pub total: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvolutionPoint {
    pub month: String,
    pub created: i64,
    pub won: i64,
    pub lost: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub owner: String,
    pub total: i64,
    pub won: i64,
    pub lost: i64,
    pub revenue: f64,
    pub conversion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueItem {
    pub code: String,
    pub title: String,
    pub owner: String,
    pub stage: String,
    pub value: f64,
    pub days_overdue: i64,
}

/// A sales board that scopes every metric query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub title: String,
}

impl Panel {
    pub fn new(title: String) -> Self {
        Self { title }
    }
}
