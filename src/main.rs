//! Site Auditor Server
//!
//! Main entry point for the auditor server

use site_auditor::AuditorBuilder;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	// Start the complete server with all defaults and setup handled automatically
	AuditorBuilder::new().start_server().await
}
