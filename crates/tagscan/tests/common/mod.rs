//! Shared test utilities for tagscan integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated batch runs with temp directories
//! - Builders for rule sets and configurations
//! - Fake decoding, OCR, export and progress collaborators

pub mod builders;
pub mod fakes;
pub mod harness;

pub use builders::*;
pub use fakes::*;
pub use harness::TestHarness;
