//! # Podtrack Common Library
//!
//! Shared code for the podtrack service including:
//! - Domain model types and status enums
//! - Configuration loading
//! - Common error type
//! - Time / timezone utilities
//! - Free-text task time allowance parsing

pub mod allowance;
pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
