//! Integration tests for the Sealights injector
//!
//! These tests spawn the actual binary or talk to a local HTTP stub.
//! They are slower and should be run separately from unit tests.

mod cli_tests;
mod download;
mod http_stub;
