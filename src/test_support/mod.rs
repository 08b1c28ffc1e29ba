//! Test utilities and fixtures for Builderer unit tests.
//!
//! Only available when compiling tests. Provides scratch workspaces on
//! disk and pre-populated registries.

pub mod fixtures;
