use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{info, warn};

use crate::models::messages::{RouteResponse, SwapRequest, SwapRoute};

#[async_trait]
pub trait RouteResolver: Send + Sync {
    /// `None` covers both "no viable path" and "service unreachable"; the
    /// difference is only logged.
    async fn resolve_route(&self, request: &SwapRequest) -> Option<SwapRoute>;
}

#[derive(Debug)]
pub enum RouteLookup {
    Found(SwapRoute),
    NotFound,
}

/// Client for the Skip `v2/fungible/route` endpoint. Issues exactly one
/// request per call.
pub struct SkipRouteClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl SkipRouteClient {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }

    pub async fn fetch_route(&self, request: &SwapRequest) -> Result<RouteLookup, String> {
        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("authorization", key);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| format!("Skip request failed: {err}"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(RouteLookup::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!(
                "Skip returned status {}: {}",
                status,
                body.trim()
            ));
        }

        let body: RouteResponse = response
            .json()
            .await
            .map_err(|err| format!("Skip response decode failed: {err}"))?;
        SwapRoute::try_from(body).map(RouteLookup::Found)
    }
}

#[async_trait]
impl RouteResolver for SkipRouteClient {
    async fn resolve_route(&self, request: &SwapRequest) -> Option<SwapRoute> {
        let started_at = Instant::now();
        let result = self.fetch_route(request).await;
        let latency_ms = started_at.elapsed().as_millis() as u64;

        match result {
            Ok(RouteLookup::Found(route)) => {
                info!(
                    event = "route_found",
                    source = request.source_asset_denom.as_str(),
                    dest = request.dest_asset_denom.as_str(),
                    amount_in = request.amount_in.as_str(),
                    estimated_amount_out = %route.estimated_amount_out,
                    operations = route.operations.len(),
                    latency_ms,
                    "Route resolved"
                );
                Some(route)
            }
            Ok(RouteLookup::NotFound) => {
                info!(
                    event = "route_not_found",
                    source = request.source_asset_denom.as_str(),
                    dest = request.dest_asset_denom.as_str(),
                    latency_ms,
                    "Skip found no route"
                );
                None
            }
            Err(error) => {
                warn!(
                    event = "route_request_failed",
                    source = request.source_asset_denom.as_str(),
                    dest = request.dest_asset_denom.as_str(),
                    latency_ms,
                    error = error.as_str(),
                    "Skip API error"
                );
                None
            }
        }
    }
}
