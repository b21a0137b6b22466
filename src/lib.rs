//! promptgate - a prompt-relay gateway with SPA fallback
//!
//! Exposes a single API route that forwards prompts to a generative-language
//! provider, and serves a static single-page frontend for everything else.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod provider;
