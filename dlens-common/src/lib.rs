//! Shared library for DermaLens microservices
//!
//! Provides the pieces every service needs: the common error type,
//! root folder resolution, and timestamp formatting for analysis records.

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
