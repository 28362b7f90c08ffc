//! Eco-Collect client: AI-assisted waste uploads, corporate verification and
//! submission history over the Eco-Collect HTTP API.

pub mod api;
pub mod busy;
pub mod capture;
pub mod classify;
pub mod components;
pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod templates;

pub use error::{Error, Result};
