//! HTTP trade sink for the price engine
//!
//! `POST {base_url}/api/simulation/{simulation_id}/external-trade` with a
//! JSON `TradeReport`. Any 2xx is a success; the body is parsed leniently
//! since both price fields of the response are optional.

use super::{TradeAck, TradeReport, TradeSink};
use crate::config::ReporterConfig;
use crate::core::ReportError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

pub struct HttpTradeSink {
    client: Client,
    endpoint: String,
}

impl HttpTradeSink {
    pub fn new(config: &ReporterConfig) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: Self::endpoint_for(&config.base_url, &config.simulation_id),
        })
    }

    pub fn endpoint_for(base_url: &str, simulation_id: &str) -> String {
        format!(
            "{}/api/simulation/{}/external-trade",
            base_url.trim_end_matches('/'),
            simulation_id
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TradeSink for HttpTradeSink {
    async fn submit(&self, report: &TradeReport) -> Result<TradeAck, ReportError> {
        let response = self.client.post(&self.endpoint).json(report).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let ack: TradeAck = serde_json::from_slice(&body).unwrap_or_default();
        trace!(id = %report.id, ?ack, "trade accepted");
        Ok(ack)
    }
}
