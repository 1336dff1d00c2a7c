// Gateway trait for the remote aggregation procedures
use crate::domain::token::AccessToken;
use async_trait::async_trait;
use serde_json::Value;

/// The fixed set of remote procedures the dashboard calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Procedure {
    Panels,
    Kpis,
    Funnel,
    Evolution,
    Ranking,
    Overdue,
}

impl Procedure {
    pub fn name(self) -> &'static str {
        match self {
            Procedure::Panels => "dashboard_panels",
            Procedure::Kpis => "dashboard_kpis",
            Procedure::Funnel => "dashboard_funnel",
            Procedure::Evolution => "dashboard_evolution",
            Procedure::Ranking => "dashboard_ranking",
            Procedure::Overdue => "dashboard_overdue",
        }
    }

    /// Label shown in the header warning list.
    pub fn label(self) -> &'static str {
        match self {
            Procedure::Panels => "Painéis",
            Procedure::Kpis => "KPIs",
            Procedure::Funnel => "Funil",
            Procedure::Evolution => "Evolução",
            Procedure::Ranking => "Ranking",
            Procedure::Overdue => "Atrasados",
        }
    }
}

#[async_trait]
pub trait MetricsGateway: Send + Sync {
    /// Call one procedure scoped to `token` and optionally a panel.
    /// Transport and decoding failures are logged by the implementation and
    /// come back as `None`, same as an empty response.
    async fn call(
        &self,
        procedure: Procedure,
        token: &AccessToken,
        panel: Option<&str>,
    ) -> Option<Value>;
}
