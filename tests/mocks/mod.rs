//! Shared test infrastructure: in-process server and fixtures

pub mod test_server;

pub use test_server::TestServer;
