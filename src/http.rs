use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;

const BODY_SNIPPET_CHARS: usize = 512;

/// Client that asks every endpoint for JSON.
pub fn json_client() -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .context("build reqwest client")
}

/// Fails on any non-2xx status, quoting the start of the body.
pub fn ensure_success(what: &str, status: StatusCode, body: &str) -> Result<()> {
    if !status.is_success() {
        let snippet: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
        anyhow::bail!(
            "GET {} non-200: status={} body_snippet={}",
            what,
            status,
            snippet
        );
    }
    Ok(())
}

/// Sends `req` and returns the body of a successful response.
pub async fn get_text(req: reqwest::RequestBuilder, what: &str) -> Result<String> {
    let resp = req
        .send()
        .await
        .with_context(|| format!("GET {} failed", what))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .with_context(|| format!("read {} body failed", what))?;
    ensure_success(what, status, &body)?;
    Ok(body)
}
