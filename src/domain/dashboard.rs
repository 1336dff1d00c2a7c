// Dashboard page domain model
use super::widgets::{ChartData, HighlightCard, TableData, TileData};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Overview,
    Funnel,
    Team,
    Alerts,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Funnel, Tab::Team, Tab::Alerts];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "📊 Visão Geral",
            Tab::Funnel => "🔻 Funil",
            Tab::Team => "👥 Equipe",
            Tab::Alerts => "🚨 Alertas",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TabLink {
    pub id: Tab,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub company_name: String,
    pub tabs: Vec<TabLink>,
    pub panels: Vec<String>,
    pub selected_panel: Option<String>,
    pub warnings: Vec<String>,
    pub status: SyncStatus,
    pub last_sync: Option<String>,
    pub syncing: bool,
}

/// Everything one tab draws below the header.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TabContent {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub tiles: Vec<TileData>,
    pub cards: Vec<HighlightCard>,
    pub charts: Vec<ChartData>,
    pub tables: Vec<TableData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<String>,
}

impl TabContent {
    pub fn section(title: &str, subtitle: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            subtitle: Some(subtitle.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub header: Header,
    pub tab: Tab,
    pub content: TabContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum DashboardPage {
    AccessDenied { message: String },
    InvalidToken { message: String },
    Unavailable { message: String, warnings: Vec<String> },
    Dashboard(Box<DashboardView>),
}

impl DashboardPage {
    pub fn access_denied() -> Self {
        DashboardPage::AccessDenied {
            message: "Acesso não autorizado. Utilize o link fornecido pela sua empresa para acessar o dashboard.".to_string(),
        }
    }

    pub fn invalid_token() -> Self {
        DashboardPage::InvalidToken {
            message: "Token inválido ou expirado. Entre em contato com o administrador.".to_string(),
        }
    }
}
