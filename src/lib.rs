//! sb-bot library
//!
//! This module exports the settings engine and the consumers built on it for
//! testing and integration.

pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
