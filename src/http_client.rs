use std::time::Duration;

use anyhow::{Context, Result, bail};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const FETCH_TIMEOUT_SECS: u64 = 15;
const AGENT: &str = concat!("matchcast/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .user_agent(AGENT)
            .build()
            .context("failed to build http client")
    })
}

/// GETs `url` and returns the body, failing on any non-2xx status.
pub fn get_text(url: &str, headers: &[(&str, &str)]) -> Result<String> {
    let mut req = http_client()?.get(url);
    for (name, value) in headers {
        req = req.header(*name, *value);
    }
    let resp = req.send().with_context(|| format!("request to {url} failed"))?;
    let status = resp.status();
    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        bail!("http {status}: {body}");
    }
    Ok(body)
}
