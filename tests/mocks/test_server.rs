//! Test server for integration tests
//!
//! Spawns the real router on an ephemeral port with mock engines wired in.

// Not every test crate touches every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;

use site_auditor::mocks::MockEngine;
use site_auditor::{AppState, AuditorBuilder, EngineName, Settings};

/// Test server instance with the mock engines it was built from
pub struct TestServer {
	pub base_url: String,
	pub handle: JoinHandle<()>,
	pub state: AppState,
	/// Handles to the registered mocks (clones share call counters)
	pub technical: MockEngine,
	pub seo: MockEngine,
}

/// Settings with test-friendly deadlines.
pub fn fast_settings() -> Settings {
	let mut settings = Settings::default();
	settings.timeouts.per_engine_ms = 500;
	settings.timeouts.global_ms = 1_000;
	settings.timeouts.request_ms = 400;
	settings
}

impl TestServer {
	/// Spawn a server whose registry holds only two well-behaved mocks:
	/// technical scoring 90 and seo scoring 70.
	pub async fn spawn() -> Result<Self, Box<dyn std::error::Error>> {
		let technical = MockEngine::new(EngineName::Technical, 90);
		let seo = MockEngine::new(EngineName::Seo, 70);
		Self::spawn_with(technical, seo, fast_settings()).await
	}

	/// Spawn a server with the given technical/seo mock pair.
	pub async fn spawn_with(
		technical: MockEngine,
		seo: MockEngine,
		settings: Settings,
	) -> Result<Self, Box<dyn std::error::Error>> {
		let (_router, state) = AuditorBuilder::default()
			.with_settings(settings)
			.without_default_engines()
			.with_engine(Arc::new(technical.clone()))
			.with_engine(Arc::new(seo.clone()))
			.start()
			.await?;

		let app: Router = site_auditor::create_router().with_state(state.clone());
		let (base_url, handle) = spawn_server_with_app(app).await?;

		Ok(Self {
			base_url,
			handle,
			state,
			technical,
			seo,
		})
	}

	pub fn abort(self) {
		self.handle.abort();
	}
}

/// Common server spawning logic
async fn spawn_server_with_app(
	app: Router,
) -> Result<(String, JoinHandle<()>), Box<dyn std::error::Error>> {
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
		.await
		.expect("bind test port");
	let addr = listener.local_addr()?;
	let base_url = format!("http://{}:{}", addr.ip(), addr.port());

	let handle = tokio::spawn(async move {
		let _ = axum::serve(listener, app).await;
	});

	// Give the server time to start
	tokio::time::sleep(Duration::from_millis(10)).await;

	Ok((base_url, handle))
}
