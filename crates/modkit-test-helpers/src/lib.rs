//! Test utilities and fixtures for modkit
//!
//! This crate provides shared test helpers used by the integration tests
//! (tests/ directories) of the other workspace crates.

pub mod fixtures;
pub mod mocks;
