//! Screenwing relay server
//!
//! Backend-for-frontend between the Screenwing browser extension and the
//! Gemini generateContent API. Holds a pool of API keys with per-key health
//! tracking, picks a healthy key per attempt, retries with rotation and
//! backoff, and post-processes responses before returning them.

pub mod classify;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod metrics;
pub mod middleware;
pub mod orchestrator;
pub mod postprocess;
pub mod prompt;
pub mod provider;
pub mod telemetry;
