// Builds typed view models from normalized procedure payloads
use crate::application::coerce::{float_field, int_field, text_field, MISSING_TEXT};
use crate::domain::metrics::{EvolutionPoint, FunnelStage, KpiSnapshot, OverdueItem, Panel, RankingRow};
use serde_json::{Map, Value};

/// Error sentinel the KPI procedure returns for an unknown token.
pub const INVALID_TOKEN_SENTINEL: &str = "token_invalido";

#[derive(Debug, Clone, PartialEq)]
pub enum KpiOutcome {
    Snapshot(KpiSnapshot),
    InvalidToken,
    Unavailable,
}

pub fn build_kpis(payload: Option<Value>) -> KpiOutcome {
    let Some(Value::Object(k)) = payload else {
        return KpiOutcome::Unavailable;
    };
    if k.get("error").and_then(Value::as_str) == Some(INVALID_TOKEN_SENTINEL) {
        return KpiOutcome::InvalidToken;
    }

    let k = Some(&k);
    KpiOutcome::Snapshot(KpiSnapshot {
        company_name: text_field(k, "company_name", ""),
        active: int_field(k, "ativos"),
        pipeline_value: float_field(k, "valor_pipeline"),
        overdue: int_field(k, "atrasados"),
        average_ticket: float_field(k, "ticket_medio"),
        won: int_field(k, "ganhos"),
        lost: int_field(k, "perdidos"),
        revenue: float_field(k, "receita"),
        conversion_rate: float_field(k, "taxa_conversao"),
    })
}

pub fn build_funnel(payload: Option<Value>) -> Option<Vec<FunnelStage>> {
    map_rows(payload, |row| FunnelStage {
        stage: text_field(row, "etapa", MISSING_TEXT),
        position: int_field(row, "position"),
        total: int_field(row, "total"),
        value: float_field(row, "valor"),
    })
}

pub fn build_evolution(payload: Option<Value>) -> Option<Vec<EvolutionPoint>> {
    map_rows(payload, |row| EvolutionPoint {
        month: text_field(row, "mes", MISSING_TEXT),
        created: int_field(row, "criados"),
        won: int_field(row, "ganhos"),
        lost: int_field(row, "perdidos"),
    })
}

pub fn build_ranking(payload: Option<Value>) -> Option<Vec<RankingRow>> {
    map_rows(payload, |row| RankingRow {
        owner: text_field(row, "responsavel", MISSING_TEXT),
        total: int_field(row, "total"),
        won: int_field(row, "ganhos"),
        lost: int_field(row, "perdidos"),
        revenue: float_field(row, "receita"),
        conversion: float_field(row, "taxa"),
    })
}

pub fn build_overdue(payload: Option<Value>) -> Option<Vec<OverdueItem>> {
    map_rows(payload, |row| OverdueItem {
        code: text_field(row, "codigo", MISSING_TEXT),
        title: text_field(row, "titulo", MISSING_TEXT),
        owner: text_field(row, "responsavel", MISSING_TEXT),
        stage: text_field(row, "etapa", MISSING_TEXT),
        value: float_field(row, "valor"),
        days_overdue: int_field(row, "dias"),
    })
}

/// Panels without a usable title cannot be selected and are dropped.
pub fn build_panels(payload: Option<Value>) -> Vec<Panel> {
    map_rows(payload, |row| text_field(row, "title", ""))
        .unwrap_or_default()
        .into_iter()
        .filter(|title| !title.is_empty())
        .map(Panel::new)
        .collect()
}

// Only arrays are row sets. Rows that are not objects still produce a
// row, made of defaults.
fn map_rows<T>(payload: Option<Value>, build: impl Fn(Option<&Map<String, Value>>) -> T) -> Option<Vec<T>> {
    match payload? {
        Value::Array(rows) => Some(rows.iter().map(|row| build(row.as_object())).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kpis_from_string_fields() {
        let payload = json!({
            "ativos": "12", "valor_pipeline": "45000.50", "atrasados": "3",
            "ticket_medio": "3750", "ganhos": "8", "perdidos": "2",
            "receita": "30000", "taxa_conversao": "80"
        });

        let expected = KpiSnapshot {
            company_name: String::new(),
            active: 12,
            pipeline_value: 45000.5,
            overdue: 3,
            average_ticket: 3750.0,
            won: 8,
            lost: 2,
            revenue: 30000.0,
            conversion_rate: 80.0,
        };
        assert_eq!(build_kpis(Some(payload)), KpiOutcome::Snapshot(expected));
    }

    #[test]
    fn test_kpis_missing_fields_are_zero() {
        let outcome = build_kpis(Some(json!({ "company_name": "Acme", "ativos": null, "receita": "n/a" })));
        let KpiOutcome::Snapshot(kpis) = outcome else {
            panic!("expected snapshot, got {:?}", outcome);
        };
        assert_eq!(kpis.company_name, "Acme");
        assert_eq!(kpis, KpiSnapshot { company_name: "Acme".to_string(), ..KpiSnapshot::default() });
    }

    #[test]
    fn test_kpis_invalid_token_sentinel() {
        let payload = json!({ "error": "token_invalido", "ativos": "12" });
        assert_eq!(build_kpis(Some(payload)), KpiOutcome::InvalidToken);
    }

    #[test]
    fn test_kpis_other_errors_still_build() {
        let outcome = build_kpis(Some(json!({ "error": "something_else" })));
        assert!(matches!(outcome, KpiOutcome::Snapshot(_)));
    }

    #[test]
    fn test_kpis_unavailable_for_non_objects() {
        assert_eq!(build_kpis(None), KpiOutcome::Unavailable);
        assert_eq!(build_kpis(Some(json!([{ "ativos": 1 }]))), KpiOutcome::Unavailable);
        assert_eq!(build_kpis(Some(json!("oops"))), KpiOutcome::Unavailable);
    }

    #[test]
    fn test_funnel_rows() {
        let payload = json!([{ "etapa": "Novo", "position": "1", "total": "10", "valor": "1000" }]);
        let funnel = build_funnel(Some(payload)).unwrap();
        assert_eq!(
            funnel,
            vec![FunnelStage { stage: "Novo".to_string(), position: 1, total: 10, value: 1000.0 }]
        );
    }

    #[test]
    fn test_rows_require_an_array() {
        assert_eq!(build_funnel(None), None);
        assert_eq!(build_evolution(Some(json!({ "mes": "jan" }))), None);
        assert_eq!(build_ranking(Some(json!(null))), None);
        assert_eq!(build_overdue(Some(json!("x"))), None);
    }

    #[test]
    fn test_overdue_defaults() {
        let payload = json!([{ "codigo": 77, "valor": "abc" }, 5]);
        let overdue = build_overdue(Some(payload)).unwrap();
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].code, "77");
        assert_eq!(overdue[0].title, "—");
        assert_eq!(overdue[0].value, 0.0);
        assert_eq!(overdue[1].owner, "—");
        assert_eq!(overdue[1].days_overdue, 0);
    }

    #[test]
    fn test_ranking_and_evolution_numbers() {
        let ranking = build_ranking(Some(json!([
            { "responsavel": "Ana", "total": 10, "ganhos": "6", "perdidos": "4", "receita": "12000.5", "taxa": "60" }
        ])))
        .unwrap();
        assert_eq!(ranking[0].owner, "Ana");
        assert_eq!(ranking[0].won, 6);
        assert_eq!(ranking[0].revenue, 12000.5);
        assert_eq!(ranking[0].conversion, 60.0);

        let evolution = build_evolution(Some(json!([{ "mes": "2024-01", "criados": "5" }]))).unwrap();
        assert_eq!(
            evolution,
            vec![EvolutionPoint { month: "2024-01".to_string(), created: 5, won: 0, lost: 0 }]
        );
    }

    #[test]
    fn test_panels_skip_untitled() {
        let panels = build_panels(Some(json!([{ "title": "Vendas" }, { "title": "" }, { "id": 3 }])));
        assert_eq!(panels, vec![Panel::new("Vendas".to_string())]);
        assert!(build_panels(None).is_empty());
    }
}
