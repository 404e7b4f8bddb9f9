//! Unit tests for the Sealights injector
//!
//! These tests use mocked ports and run fast without network I/O.

mod mocks;
