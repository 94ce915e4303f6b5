//! Unit tests for the devenv CLI
//!
//! These tests use in-memory fakes for every remote port and run fast
//! without external I/O.

mod deploy_pipeline_service;
mod mocks;
mod provision_service;
mod session_service;
