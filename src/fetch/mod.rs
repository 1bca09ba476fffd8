//! Access to the arrival feed.
//!
//! [`HttpClient`] is the transport seam; [`auth`] wrappers decorate it and
//! [`TranslocSource`] turns a configured client into an [`ArrivalSource`].
//! [`FileSource`] replays a saved payload instead.

mod client;
mod basic;
mod file;
mod transloc;
pub mod auth;

pub use client::HttpClient;
pub use basic::BasicClient;
pub use file::FileSource;
pub use transloc::{TranslocSource, arrival_times_url};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;

/// Anything that can produce one raw arrival payload.
#[async_trait]
pub trait ArrivalSource: Send + Sync {
    async fn fetch(&self) -> Result<Value>;
}

/// GETs `url` and decodes the body as JSON.
///
/// # Errors
///
/// Fails on transport errors, non-success status codes and bodies that are
/// not valid JSON.
pub async fn fetch_json<C: HttpClient>(client: &C, url: &str) -> Result<Value> {
    let mut req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);
    req.headers_mut()
        .insert(ACCEPT, HeaderValue::from_static("application/json"));

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.json().await?)
}
