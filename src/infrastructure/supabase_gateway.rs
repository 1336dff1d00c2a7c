// Supabase PostgREST gateway for the dashboard RPC functions
use crate::application::metrics_gateway::{MetricsGateway, Procedure};
use crate::domain::token::AccessToken;
use crate::infrastructure::config::BackendSettings;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct SupabaseGateway {
    base_url: String,
    api_key: String,
    token_param: String,
    panel_param: String,
    client: reqwest::Client,
}

impl SupabaseGateway {
    pub fn new(settings: &BackendSettings) -> Self {
        Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            token_param: settings.token_param.clone(),
            panel_param: settings.panel_param.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn rpc_url(&self, procedure: Procedure) -> String {
        format!(
            "{}/rest/v1/rpc/{}",
            self.base_url,
            urlencoding::encode(procedure.name())
        )
    }

    // The panel argument is left out entirely when unscoped.
    fn request_body(&self, token: &AccessToken, panel: Option<&str>) -> Value {
        let mut body = Map::new();
        body.insert(self.token_param.clone(), Value::from(token.as_str()));
        if let Some(panel) = panel {
            body.insert(self.panel_param.clone(), Value::from(panel));
        }
        Value::Object(body)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("prefer", HeaderValue::from_static("return=representation"));
        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    async fn execute_rpc(
        &self,
        procedure: Procedure,
        token: &AccessToken,
        panel: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let response = self
            .client
            .post(self.rpc_url(procedure))
            .headers(self.headers())
            .json(&self.request_body(token, panel))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MetricsGateway for SupabaseGateway {
    async fn call(
        &self,
        procedure: Procedure,
        token: &AccessToken,
        panel: Option<&str>,
    ) -> Option<Value> {
        match self.execute_rpc(procedure, token, panel).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("RPC {} failed: {}", procedure.name(), e);
                None
            }
        }
    }
}
