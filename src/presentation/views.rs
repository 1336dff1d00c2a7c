// Tab views - Derives render-ready widgets from the committed snapshot
use crate::application::orchestrator::DashboardSnapshot;
use crate::domain::dashboard::{DashboardPage, DashboardView, Header, SyncStatus, Tab, TabContent, TabLink};
use crate::domain::metrics::{EvolutionPoint, FunnelStage, KpiSnapshot, OverdueItem, Panel, RankingRow};
use crate::domain::widgets::{
    palette_color, Accent, Align, Cell, ChartData, ChartKind, Column, HighlightCard, SeriesData, SeriesStyle,
    TableData, TileData,
};
use crate::presentation::format::{format_brl, format_days, format_num, format_percent};

const TOP_PERFORMERS: usize = 4;
const MEDALS: [(&str, Accent); TOP_PERFORMERS] = [
    ("🥇", Accent::Amber),
    ("🥈", Accent::Silver),
    ("🥉", Accent::Bronze),
    ("4️⃣", Accent::Brand),
];

/// Render the page for `tab`. Never fetches: everything comes from `snapshot`.
pub fn render_page(snapshot: &DashboardSnapshot, panels: &[Panel], syncing: bool, tab: Tab) -> DashboardPage {
    if snapshot.invalid_token {
        return DashboardPage::invalid_token();
    }
    let Some(kpis) = &snapshot.kpis else {
        return DashboardPage::Unavailable {
            message: "Não foi possível carregar os indicadores. Nova tentativa na próxima atualização.".to_string(),
            warnings: snapshot.errors.clone(),
        };
    };

    let content = match tab {
        Tab::Overview => overview(kpis, snapshot.evolution.as_deref().unwrap_or_default()),
        Tab::Funnel => funnel(snapshot.funnel.as_deref().unwrap_or_default(), snapshot.panel.as_deref()),
        Tab::Team => team(snapshot.ranking.as_deref().unwrap_or_default()),
        Tab::Alerts => alerts(snapshot.overdue.as_deref().unwrap_or_default()),
    };

    DashboardPage::Dashboard(Box::new(DashboardView {
        header: header(snapshot, kpis, panels, syncing, tab),
        tab,
        content,
    }))
}

fn header(snapshot: &DashboardSnapshot, kpis: &KpiSnapshot, panels: &[Panel], syncing: bool, tab: Tab) -> Header {
    Header {
        company_name: kpis.company_name.clone(),
        tabs: Tab::ALL
            .into_iter()
            .map(|id| TabLink {
                id,
                label: id.label(),
                active: id == tab,
            })
            .collect(),
        panels: panels.iter().map(|p| p.title.clone()).collect(),
        selected_panel: snapshot.panel.clone(),
        warnings: snapshot.errors.clone(),
        status: if snapshot.errors.is_empty() {
            SyncStatus::Ok
        } else {
            SyncStatus::Degraded
        },
        last_sync: snapshot.last_sync.map(|t| t.format("%H:%M").to_string()),
        syncing,
    }
}

fn overview(kpis: &KpiSnapshot, evolution: &[EvolutionPoint]) -> TabContent {
    let overdue_subtitle = if kpis.overdue > 0 {
        "⚡ Ação necessária"
    } else {
        "✓ Tudo em dia"
    };
    let tiles = vec![
        TileData::new("active", "Cards Ativos", format_num(kpis.active), Accent::Brand).with_subtitle("No pipeline"),
        TileData::new("pipeline_value", "Valor Pipeline", format_brl(kpis.pipeline_value), Accent::Amber),
        TileData::new("overdue", "Atrasados", format_num(kpis.overdue), Accent::Red).with_subtitle(overdue_subtitle),
        TileData::new("average_ticket", "Ticket Médio", format_brl(kpis.average_ticket), Accent::Purple),
        TileData::new("won", "Ganhos", format_num(kpis.won), Accent::Green),
        TileData::new("lost", "Perdidos", format_num(kpis.lost), Accent::Red),
        TileData::new("revenue", "Receita Total", format_brl(kpis.revenue), Accent::Emerald),
        TileData::new("conversion", "Conversão", format_percent(kpis.conversion_rate), Accent::Cyan),
    ];

    let evolution_chart = ChartData::new("evolution", "📈 Evolução Mensal", ChartKind::Area, 280);
    let evolution_chart = if evolution.is_empty() {
        evolution_chart.empty("Dados insuficientes")
    } else {
        let months = evolution.iter().map(|p| p.month.clone()).collect();
        let series = vec![
            SeriesData::new("created", "Criados", SeriesStyle::Area, evolution.iter().map(|p| p.created as f64).collect())
                .colored(Accent::Brand),
            SeriesData::new("won", "Ganhos", SeriesStyle::Area, evolution.iter().map(|p| p.won as f64).collect())
                .colored(Accent::Green),
            SeriesData::new("lost", "Perdidos", SeriesStyle::Line, evolution.iter().map(|p| p.lost as f64).collect())
                .colored(Accent::Red),
        ];
        evolution_chart.with_data(months, series)
    };

    let slices = distribution(kpis);
    let distribution_chart = ChartData::new("distribution", "📊 Distribuição", ChartKind::Donut, 280);
    let distribution_chart = if slices.is_empty() {
        distribution_chart.empty("Sem dados")
    } else {
        let categories = slices.iter().map(|(name, _, _)| name.to_string()).collect();
        let series = SeriesData::new(
            "distribution",
            "Distribuição",
            SeriesStyle::Slice,
            slices.iter().map(|(_, value, _)| *value).collect(),
        )
        .with_point_colors(slices.iter().map(|(_, _, accent)| *accent).collect());
        distribution_chart.with_data(categories, vec![series])
    };

    TabContent {
        tiles,
        charts: vec![evolution_chart, distribution_chart],
        ..TabContent::default()
    }
}

fn funnel(stages: &[FunnelStage], panel: Option<&str>) -> TabContent {
    let subtitle = match panel {
        Some(panel) => format!("Painel: {}", panel),
        None => "Todos os painéis".to_string(),
    };
    let mut content = TabContent::section("Funil de Vendas", &subtitle);
    if stages.is_empty() {
        content.empty_state = Some("Nenhum dado no funil".to_string());
        return content;
    }

    let mut stages = stages.to_vec();
    stages.sort_by_key(|s| s.position);

    let names: Vec<String> = stages.iter().map(|s| s.stage.clone()).collect();
    let colors: Vec<Accent> = (0..stages.len()).map(palette_color).collect();

    content.charts.push(
        ChartData::new("stage_cards", "Cards por Etapa", ChartKind::HorizontalBar, bar_height(250, stages.len(), 45))
            .with_data(
                names.clone(),
                vec![SeriesData::new("total", "Cards", SeriesStyle::Bar, stages.iter().map(|s| s.total as f64).collect())
                    .with_point_colors(colors.clone())],
            ),
    );
    content.charts.push(
        ChartData::new("stage_value", "Valor por Etapa (R$)", ChartKind::Bar, 280)
            .currency()
            .with_data(
                names,
                vec![SeriesData::new("value", "Valor", SeriesStyle::Bar, stages.iter().map(|s| s.value).collect())
                    .with_point_colors(colors)],
            ),
    );

    let grand_total: f64 = stages.iter().map(|s| s.total as f64).sum();
    let rows = stages
        .iter()
        .map(|s| {
            vec![
                Cell::text(s.stage.clone()),
                Cell::text(s.total.to_string()),
                Cell::text(format_brl(s.value)),
                Cell::text(funnel_share(s.total, grand_total)),
            ]
        })
        .collect();
    content.tables.push(TableData::new(
        "stages",
        "Detalhamento",
        vec![
            Column::new("stage", "Etapa", Align::Left),
            Column::new("total", "Cards", Align::Center),
            Column::new("value", "Valor", Align::Right),
            Column::new("share", "% Total", Align::Center),
        ],
        rows,
    ));
    content
}

fn team(ranking: &[RankingRow]) -> TabContent {
    let mut content = TabContent::section("Performance da Equipe", "Desempenho individual");
    if ranking.is_empty() {
        content.empty_state = Some("Sem dados de responsáveis".to_string());
        return content;
    }

    content.cards = top_performers(ranking)
        .iter()
        .zip(MEDALS)
        .map(|(row, (medal, accent))| HighlightCard {
            medal: medal.to_string(),
            accent,
            owner: row.owner.clone(),
            revenue: format_brl(row.revenue),
            conversion: highlight_badge(row.conversion),
            summary: format!("{} ganhos · {} perdidos · {} total", row.won, row.lost, row.total),
        })
        .collect();

    content.charts.push(
        ChartData::new("owner_revenue", "Receita por Responsável", ChartKind::HorizontalBar, bar_height(180, ranking.len(), 40))
            .currency()
            .with_data(
                ranking.iter().map(|r| r.owner.clone()).collect(),
                vec![SeriesData::new("revenue", "Receita", SeriesStyle::Bar, ranking.iter().map(|r| r.revenue).collect())
                    .colored(Accent::Green)],
            ),
    );

    let rows = ranking
        .iter()
        .map(|r| {
            vec![
                Cell::text(r.owner.clone()),
                Cell::text(r.total.to_string()),
                Cell::badge(r.won.to_string(), Accent::Green),
                Cell::badge(r.lost.to_string(), Accent::Red),
                Cell::text(format_brl(r.revenue)),
                conversion_badge(r.conversion),
            ]
        })
        .collect();
    content.tables.push(TableData::new(
        "ranking",
        "Ranking Completo",
        vec![
            Column::new("owner", "Responsável", Align::Left),
            Column::new("total", "Total", Align::Center),
            Column::new("won", "Ganhos", Align::Center),
            Column::new("lost", "Perdidos", Align::Center),
            Column::new("revenue", "Receita", Align::Right),
            Column::new("conversion", "Conversão", Align::Center),
        ],
        rows,
    ));
    content
}

fn alerts(overdue: &[OverdueItem]) -> TabContent {
    let mut content = TabContent::section("Alertas e Atrasos", "Cards atrasados e valores em risco");
    let summary = AlertSummary::from_items(overdue);
    content.tiles = vec![
        TileData::new("overdue_count", "Atrasados", format_num(summary.count as i64), Accent::Red),
        TileData::new("value_at_risk", "Valor em Risco", format_brl(summary.value_at_risk), Accent::Amber),
        TileData::new("max_delay", "Maior Atraso", format_days(summary.max_days), Accent::Red),
        TileData::new("mean_delay", "Média Atraso", format_days(summary.mean_days), Accent::Amber),
    ];
    if overdue.is_empty() {
        content.empty_state = Some("🎉 Nenhum card atrasado! Todos os cards estão dentro do prazo.".to_string());
        return content;
    }

    let per_owner = overdue_by_owner(overdue);
    content.charts.push(
        ChartData::new("overdue_by_owner", "Atrasados por Responsável", ChartKind::HorizontalBar, bar_height(150, per_owner.len(), 40))
            .with_data(
                per_owner.iter().map(|(owner, _)| owner.clone()).collect(),
                vec![SeriesData::new("count", "Atrasados", SeriesStyle::Bar, per_owner.iter().map(|(_, n)| *n as f64).collect())
                    .colored(Accent::Red)],
            ),
    );

    let rows = overdue
        .iter()
        .map(|o| {
            vec![
                Cell::badge(o.code.clone(), Accent::Brand),
                Cell::text(o.title.clone()),
                Cell::text(o.owner.clone()),
                Cell::text(o.stage.clone()),
                Cell::text(format_brl(o.value)),
                Cell::badge(format_days(o.days_overdue), if o.days_overdue > 7 { Accent::Red } else { Accent::Amber }),
            ]
        })
        .collect();
    content.tables.push(TableData::new(
        "overdue",
        "Detalhamento — Cards Atrasados",
        vec![
            Column::new("code", "Código", Align::Left),
            Column::new("title", "Título", Align::Left),
            Column::new("owner", "Responsável", Align::Left),
            Column::new("stage", "Etapa", Align::Left),
            Column::new("value", "Valor", Align::Right),
            Column::new("days", "Atraso", Align::Center),
        ],
        rows,
    ));
    content
}

fn bar_height(min: u32, rows: usize, per_row: u32) -> u32 {
    min.max(u32::try_from(rows).unwrap_or(u32::MAX).saturating_mul(per_row))
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertSummary {
    pub count: usize,
    pub value_at_risk: f64,
    pub max_days: i64,
    pub mean_days: i64,
}

impl AlertSummary {
    pub fn from_items(items: &[OverdueItem]) -> Self {
        if items.is_empty() {
            return Self {
                count: 0,
                value_at_risk: 0.0,
                max_days: 0,
                mean_days: 0,
            };
        }
        let total_days: f64 = items.iter().map(|o| o.days_overdue as f64).sum();
        let mean = total_days / items.len() as f64;
        Self {
            count: items.len(),
            value_at_risk: items.iter().map(|o| o.value).sum(),
            max_days: items.iter().map(|o| o.days_overdue).max().unwrap_or(0),
            // Halves round up
            mean_days: (mean + 0.5).floor() as i64,
        }
    }
}

/// Overdue count per owner, most overdue first. Ties keep first-seen order.
pub fn overdue_by_owner(items: &[OverdueItem]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(owner, _)| *owner == item.owner) {
            Some((_, count)) => *count += 1,
            None => counts.push((item.owner.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn funnel_share(total: i64, grand_total: f64) -> String {
    if grand_total > 0.0 {
        format!("{:.1}%", total as f64 * 100.0 / grand_total)
    } else {
        "0%".to_string()
    }
}

/// Won / lost / pipeline slices, zero slices dropped.
pub fn distribution(kpis: &KpiSnapshot) -> Vec<(&'static str, f64, Accent)> {
    [
        ("Ganhos", kpis.won, Accent::Green),
        ("Perdidos", kpis.lost, Accent::Red),
        ("Pipeline", kpis.active, Accent::Brand),
    ]
    .into_iter()
    .filter(|(_, value, _)| *value > 0)
    .map(|(name, value, accent)| (name, value as f64, accent))
    .collect()
}

pub fn top_performers(ranking: &[RankingRow]) -> &[RankingRow] {
    &ranking[..ranking.len().min(TOP_PERFORMERS)]
}

fn conversion_text(rate: f64) -> String {
    if rate != 0.0 {
        format_percent(rate)
    } else {
        "—".to_string()
    }
}

pub fn conversion_badge(rate: f64) -> Cell {
    let accent = if rate >= 50.0 {
        Accent::Green
    } else if rate >= 25.0 {
        Accent::Amber
    } else {
        Accent::Red
    };
    Cell::badge(conversion_text(rate), accent)
}

fn highlight_badge(rate: f64) -> Cell {
    let accent = if rate >= 50.0 { Accent::Green } else { Accent::Amber };
    Cell::badge(conversion_text(rate), accent)
}
