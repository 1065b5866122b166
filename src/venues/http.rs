// Remote quote provider module
// This file implements a liquidity source whose quote function lives behind a
// JSON-RPC endpoint, for venues that are quoted by an external service
//
// Numan Thabit 2025 Nov

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use super::adapter::{AssetPair, LiquiditySource, SourceDescriptor};
use crate::errors::SourceError;

#[derive(Debug, Clone)]
pub struct HttpQuoteSource {
    desc: SourceDescriptor,
    http: Client,
    url: String,
    method: String,
}

impl HttpQuoteSource {
    pub fn new(
        desc: SourceDescriptor,
        url: impl Into<String>,
        method: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Provider(format!("http client: {e}")))?;
        Ok(Self {
            desc,
            http,
            url: url.into(),
            method: method.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    fn payload(&self, pair: &AssetPair, amount_in: u128) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": self.method,
            "params": [pair.from.as_str(), pair.to.as_str(), amount_in.to_string()]
        })
    }
}

/// Extract the quoted amount from a JSON-RPC response body. The result may be
/// a decimal string or a JSON number.
pub fn decode_quote(body: &serde_json::Value) -> Result<u128, SourceError> {
    if let Some(err) = body.get("error") {
        return Err(SourceError::Provider(err.to_string()));
    }
    match body.get("result") {
        Some(serde_json::Value::String(s)) => s
            .parse::<u128>()
            .map_err(|e| SourceError::Provider(format!("decode result {s:?}: {e}"))),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| SourceError::Provider(format!("non-integer result {n}"))),
        Some(serde_json::Value::Null) | None => Err(SourceError::InsufficientLiquidity),
        Some(other) => Err(SourceError::Provider(format!("unexpected result {other}"))),
    }
}

#[async_trait]
impl LiquiditySource for HttpQuoteSource {
    fn descriptor(&self) -> &SourceDescriptor {
        &self.desc
    }

    async fn quote(&self, pair: &AssetPair, amount_in: u128) -> Result<u128, SourceError> {
        let resp = self
            .http
            .post(&self.url)
            .json(&self.payload(pair, amount_in))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Provider(format!("send: {e}"))
                }
            })?;
        if !resp.status().is_success() {
            return Err(SourceError::Provider(format!("http {}", resp.status())));
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SourceError::Provider(format!("json parse: {e}")))?;
        decode_quote(&body)
    }
}
