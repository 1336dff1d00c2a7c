// HTTP request handlers
use crate::application::orchestrator::DashboardSnapshot;
use crate::application::session::DashboardSession;
use crate::domain::dashboard::{DashboardPage, Tab};
use crate::domain::token::AccessToken;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::views::render_page;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::WatchStream;

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub token: Option<String>,
    #[serde(default)]
    pub tab: Tab,
}

#[derive(Deserialize)]
pub struct PanelQuery {
    pub token: Option<String>,
    #[serde(default)]
    pub tab: Tab,
    pub panel: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current dashboard page for one tab. Switching tabs never refetches.
pub async fn show_dashboard(
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Some(session) = open_session(&state, query.token.as_deref()).await else {
        return page_response(DashboardPage::access_denied(), compress).await;
    };

    let snapshot = session.wait_until_loaded().await;
    render(&session, &snapshot, query.tab, compress).await
}

/// Manual refresh; safe to call while another cycle is in flight.
pub async fn refresh_dashboard(
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Some(session) = open_session(&state, query.token.as_deref()).await else {
        return page_response(DashboardPage::access_denied(), compress).await;
    };

    let snapshot = session.refresh().await;
    render(&session, &snapshot, query.tab, compress).await
}

/// Re-scope every metric to one panel; an absent or empty panel means all panels.
pub async fn select_panel(
    Query(query): Query<PanelQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Some(session) = open_session(&state, query.token.as_deref()).await else {
        return page_response(DashboardPage::access_denied(), compress).await;
    };

    let snapshot = session.select_panel(query.panel).await;
    render(&session, &snapshot, query.tab, compress).await
}

pub async fn list_panels(
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let Some(session) = open_session(&state, query.token.as_deref()).await else {
        return page_response(DashboardPage::access_denied(), compress).await;
    };

    match json_response(StatusCode::OK, session.panels().await, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Server-sent events: one rendered page per committed snapshot.
pub async fn stream_dashboard(
    Query(query): Query<DashboardQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(session) = open_session(&state, query.token.as_deref()).await else {
        return page_response(DashboardPage::access_denied(), false).await;
    };

    let snapshot = session.wait_until_loaded().await;
    let panels = if snapshot.invalid_token {
        Vec::new()
    } else {
        session.panels().await.to_vec()
    };
    let tab = query.tab;

    let stream = WatchStream::new(session.subscribe())
        .filter(|snapshot| std::future::ready(snapshot.is_loaded()))
        .map(move |snapshot| {
            let page = render_page(&snapshot, &panels, session.is_syncing(), tab);
            let event = Event::default().json_data(&page).unwrap_or_else(|e| {
                tracing::error!("Failed to serialize dashboard event: {}", e);
                Event::default().event("error").data(e.to_string())
            });
            Ok::<_, Infallible>(event)
        });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

// No token means no session and no network call.
async fn open_session(state: &AppState, token: Option<&str>) -> Option<Arc<DashboardSession>> {
    let token = AccessToken::parse(token)?;
    Some(state.sessions.get_or_start(token).await)
}

async fn render(session: &DashboardSession, snapshot: &DashboardSnapshot, tab: Tab, compress: bool) -> Response {
    let page = if snapshot.invalid_token {
        render_page(snapshot, &[], false, tab)
    } else {
        render_page(snapshot, session.panels().await, session.is_syncing(), tab)
    };
    page_response(page, compress).await
}

async fn page_response(page: DashboardPage, compress: bool) -> Response {
    let status = page_status(&page);
    match json_response(status, &page, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

fn page_status(page: &DashboardPage) -> StatusCode {
    match page {
        DashboardPage::AccessDenied { .. } => StatusCode::FORBIDDEN,
        DashboardPage::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
        DashboardPage::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        DashboardPage::Dashboard(_) => StatusCode::OK,
    }
}
