//! Integration tests for upstream-gateway
//!
//! These tests drive the public `Gateway` API against a scripted upstream
//! and a manual clock.

pub mod batch_tests;
pub mod config_tests;
pub mod error_handling_tests;
pub mod gateway_tests;
