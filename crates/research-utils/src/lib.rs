//! Shared utilities for finresearch
//!
//! This crate provides common functionality used across the finresearch workspace,
//! including logging setup and environment helpers.

pub mod env;
pub mod logging;

pub use env::{load_dotenv, non_empty_env, non_empty_env_or};
pub use logging::{LogFormat, init_tracing_with};
