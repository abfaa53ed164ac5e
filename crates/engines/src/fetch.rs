//! Shared HTTP fetch layer for engine adapters
//!
//! Provides pooled reqwest clients keyed by runtime configuration, bounded
//! request timeouts, and a single idempotent retry on transient connection
//! errors.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use reqwest::{redirect, Client, ClientBuilder};
use tracing::debug;

use auditor_types::{EngineError, EngineResult, EngineRuntimeConfig};

const MAX_REDIRECTS: usize = 10;
/// Hard ceiling on bytes read from a target, to keep runaway pages bounded.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// How the client treats response encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FetchMode {
	/// Auto-decompressed body, for content inspection
	Content,
	/// No auto-decompression, explicit Accept-Encoding, for transfer probes
	Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
	user_agent: String,
	timeout_ms: u64,
	mode: FetchMode,
}

/// One fetched response with the facts engines care about.
#[derive(Debug, Clone)]
pub struct FetchedPage {
	pub status: u16,
	pub final_url: String,
	/// True when the final URL differs from the requested one
	pub redirected: bool,
	/// Milliseconds until response headers arrived
	pub ttfb_ms: u64,
	/// Milliseconds until the body was fully read
	pub elapsed_ms: u64,
	pub content_type: String,
	/// Present only in [`Fetcher::get_transfer`] responses
	pub content_encoding: Option<String>,
	pub cache_control: Option<String>,
	pub body: String,
	/// On-the-wire size for transfer probes, decoded size otherwise
	pub body_bytes: usize,
}

impl FetchedPage {
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Thread-safe pool of HTTP clients, one per (user agent, timeout, mode).
///
/// Engines share a single `Fetcher`; clients are built lazily on first use of
/// a configuration and reused across invocations and jobs.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
	clients: Arc<DashMap<ClientKey, Client>>,
}

impl Fetcher {
	pub fn new() -> Self {
		Self::default()
	}

	fn client_for(&self, config: &EngineRuntimeConfig, mode: FetchMode) -> EngineResult<Client> {
		let key = ClientKey {
			user_agent: config.user_agent.clone(),
			timeout_ms: config.request_timeout_ms,
			mode,
		};

		if let Some(client) = self.clients.get(&key) {
			return Ok(client.clone());
		}

		debug!("Building HTTP client for {:?}", key);
		let mut builder: ClientBuilder = Client::builder()
			.user_agent(&config.user_agent)
			.timeout(Duration::from_millis(config.request_timeout_ms))
			.redirect(redirect::Policy::limited(MAX_REDIRECTS));
		if mode == FetchMode::Transfer {
			// Keep the wire representation so content-encoding and transfer
			// size survive into the response.
			builder = builder.no_gzip();
		}
		let client = builder.build().map_err(|e| EngineError::Config {
			reason: format!("failed to build HTTP client: {}", e),
		})?;

		let entry = self.clients.entry(key).or_insert(client);
		Ok(entry.clone())
	}

	/// Fetch a page for content inspection (body auto-decompressed).
	pub async fn get(
		&self,
		url: &str,
		config: &EngineRuntimeConfig,
	) -> EngineResult<FetchedPage> {
		self.get_in_mode(url, config, FetchMode::Content).await
	}

	/// Fetch a page keeping the wire representation, advertising gzip
	/// support, for transfer-level measurements.
	pub async fn get_transfer(
		&self,
		url: &str,
		config: &EngineRuntimeConfig,
	) -> EngineResult<FetchedPage> {
		self.get_in_mode(url, config, FetchMode::Transfer).await
	}

	async fn get_in_mode(
		&self,
		url: &str,
		config: &EngineRuntimeConfig,
		mode: FetchMode,
	) -> EngineResult<FetchedPage> {
		match self.fetch_once(url, config, mode).await {
			Ok(page) => Ok(page),
			// One retry for idempotent transient conditions only.
			Err(e) if e.is_transient() => {
				debug!("Retrying {} after transient error: {}", url, e);
				self.fetch_once(url, config, mode).await
			},
			Err(e) => Err(e),
		}
	}

	async fn fetch_once(
		&self,
		url: &str,
		config: &EngineRuntimeConfig,
		mode: FetchMode,
	) -> EngineResult<FetchedPage> {
		let client = self.client_for(config, mode)?;
		let started = Instant::now();

		let mut request = client.get(url);
		if mode == FetchMode::Transfer {
			request = request.header("Accept-Encoding", "gzip");
		}

		let response = request
			.send()
			.await
			.map_err(|e| map_reqwest_error(url, config.request_timeout_ms, e))?;
		let ttfb_ms = started.elapsed().as_millis() as u64;

		let status = response.status().as_u16();
		let final_url = response.url().to_string();
		let redirected = final_url.trim_end_matches('/') != url.trim_end_matches('/');
		let header = |name: &str| {
			response
				.headers()
				.get(name)
				.and_then(|v| v.to_str().ok())
				.map(|v| v.to_string())
		};
		let content_type = header("content-type").unwrap_or_default();
		let content_encoding = header("content-encoding");
		let cache_control = header("cache-control");

		let bytes = response
			.bytes()
			.await
			.map_err(|e| map_reqwest_error(url, config.request_timeout_ms, e))?;
		let elapsed_ms = started.elapsed().as_millis() as u64;

		let body_bytes = bytes.len().min(MAX_BODY_BYTES);
		let body = match mode {
			FetchMode::Content => {
				String::from_utf8_lossy(&bytes[..body_bytes]).into_owned()
			},
			// Wire bytes may be compressed; the text is not meaningful.
			FetchMode::Transfer => String::new(),
		};

		Ok(FetchedPage {
			status,
			final_url,
			redirected,
			ttfb_ms,
			elapsed_ms,
			content_type,
			content_encoding,
			cache_control,
			body,
			body_bytes,
		})
	}
}

fn map_reqwest_error(url: &str, timeout_ms: u64, e: reqwest::Error) -> EngineError {
	if e.is_timeout() {
		return EngineError::Timeout { timeout_ms };
	}
	if e.is_connect() {
		let reason = e.to_string();
		if reason.contains("dns") {
			let host = url::Url::parse(url)
				.ok()
				.and_then(|u| u.host_str().map(|h| h.to_string()))
				.unwrap_or_else(|| url.to_string());
			return EngineError::DnsFailure { host };
		}
		return EngineError::Connection { reason };
	}
	EngineError::Http {
		reason: e.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_client_reuse_per_configuration() {
		let fetcher = Fetcher::new();
		let config = EngineRuntimeConfig::default();

		fetcher.client_for(&config, FetchMode::Content).unwrap();
		fetcher.client_for(&config, FetchMode::Content).unwrap();
		assert_eq!(fetcher.clients.len(), 1);

		fetcher.client_for(&config, FetchMode::Transfer).unwrap();
		assert_eq!(fetcher.clients.len(), 2);

		let other = EngineRuntimeConfig {
			request_timeout_ms: 1_000,
			..EngineRuntimeConfig::default()
		};
		fetcher.client_for(&other, FetchMode::Content).unwrap();
		assert_eq!(fetcher.clients.len(), 3);
	}
}
