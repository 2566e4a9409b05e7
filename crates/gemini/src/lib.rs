//! REST client for Google's Gemini `generateContent` endpoint.
//!
//! Provides typed request/response wire types, a thin [`reqwest`] wrapper,
//! and an [`tryon_core::generation::ImageGenerator`] implementation that
//! forwards a person and a garment image as base64 inline data.

pub mod api;
pub mod config;
pub mod messages;

pub use api::GeminiClient;
pub use config::GeminiConfig;
