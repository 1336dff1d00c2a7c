// In-memory gateway for orchestrator and session tests
use crate::application::metrics_gateway::{MetricsGateway, Procedure};
use crate::domain::token::AccessToken;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub procedure: Procedure,
    pub token: String,
    pub panel: Option<String>,
}

#[derive(Default)]
pub struct FakeGateway {
    responses: Mutex<HashMap<Procedure, Value>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeGateway {
    /// Every procedure answers with a small, valid payload.
    pub fn healthy() -> Self {
        let gateway = Self::default();
        gateway.respond(Procedure::Panels, json!([{ "title": "Vendas" }, { "title": "Pós-venda" }]));
        gateway.respond(
            Procedure::Kpis,
            json!({
                "company_name": "Acme", "ativos": "12", "valor_pipeline": "45000.50", "atrasados": "3",
                "ticket_medio": "3750", "ganhos": "8", "perdidos": "2", "receita": "30000",
                "taxa_conversao": "80"
            }),
        );
        gateway.respond(
            Procedure::Funnel,
            json!([{ "dashboard_funnel": [{ "etapa": "Novo", "position": "1", "total": "10", "valor": "1000" }] }]),
        );
        gateway.respond(Procedure::Evolution, json!([{ "mes": "2024-01", "criados": 4, "ganhos": 2, "perdidos": 1 }]));
        gateway.respond(
            Procedure::Ranking,
            json!({ "dashboard_ranking": [{ "responsavel": "Ana", "total": 10, "ganhos": 8, "perdidos": 2, "receita": 30000, "taxa": 80 }] }),
        );
        gateway.respond(
            Procedure::Overdue,
            json!([{ "codigo": "C-1", "titulo": "Renovação", "responsavel": "Ana", "etapa": "Novo", "valor": "500", "dias": "9" }]),
        );
        gateway
    }

    pub fn respond(&self, procedure: Procedure, value: Value) {
        self.responses.lock().unwrap().insert(procedure, value);
    }

    pub fn fail(&self, procedure: Procedure) {
        self.responses.lock().unwrap().remove(&procedure);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, procedure: Procedure) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.procedure == procedure).collect()
    }
}

#[async_trait]
impl MetricsGateway for FakeGateway {
    async fn call(&self, procedure: Procedure, token: &AccessToken, panel: Option<&str>) -> Option<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            procedure,
            token: token.as_str().to_string(),
            panel: panel.map(str::to_string),
        });
        self.responses.lock().unwrap().get(&procedure).cloned()
    }
}
