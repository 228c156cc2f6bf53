//! Wolfram|Alpha adapter (v2 query API, JSON output).

use async_trait::async_trait;
use serde::Deserialize;

use modbot_core::{
    errors::Error,
    ports::{KnowledgeEngine, Pod, QueryResult, Subpod},
    Result,
};

#[derive(Clone, Debug)]
pub struct WolframClient {
    api_url: String,
    http: reqwest::Client,
}

impl WolframClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .map_err(|e| Error::External(format!("wolfram client build error: {e}")))?;
        Ok(Self {
            api_url: api_url.into(),
            http,
        })
    }
}

#[async_trait]
impl KnowledgeEngine for WolframClient {
    async fn query(&self, app_id: &str, input: &str) -> Result<QueryResult> {
        let resp = self
            .http
            .get(&self.api_url)
            .query(&[("appid", app_id), ("input", input), ("output", "json")])
            .send()
            .await
            .map_err(|e| Error::External(format!("wolfram request error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "wolfram query failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::External(format!("wolfram read error: {e}")))?;
        parse_response(&body)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    queryresult: RawResult,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: serde_json::Value,
    #[serde(default)]
    pods: Vec<RawPod>,
}

#[derive(Debug, Deserialize)]
struct RawPod {
    #[serde(default)]
    title: String,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    subpods: Vec<RawSubpod>,
}

#[derive(Debug, Deserialize)]
struct RawSubpod {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    plaintext: Option<String>,
}

/// Parse a JSON query response into the port's result type.
pub fn parse_response(body: &str) -> Result<QueryResult> {
    let env: Envelope = serde_json::from_str(body)?;
    let raw = env.queryresult;

    // `error` is `false` on success, otherwise an object with `msg`.
    let error = match &raw.error {
        serde_json::Value::Object(o) => Some(
            o.get("msg")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        ),
        serde_json::Value::Bool(true) => Some("unknown error".to_string()),
        _ => None,
    };

    let pods = raw
        .pods
        .into_iter()
        .map(|p| Pod {
            title: p.title,
            primary: p.primary,
            subpods: p
                .subpods
                .into_iter()
                .map(|s| Subpod {
                    title: s.title,
                    plaintext: s.plaintext,
                })
                .collect(),
        })
        .collect();

    Ok(QueryResult {
        success: raw.success,
        error,
        pods,
    })
}
