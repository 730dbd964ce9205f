//! Consolidated test utilities for the PSE&G usage poller.
//!
//! This module provides a centralized location for mock login strategies,
//! portal HTML builders, and test configurations used throughout the
//! codebase.

#![cfg(test)]

pub mod config;
pub mod html;
pub mod mocks;
