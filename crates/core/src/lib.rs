//! Domain building blocks for the virtual try-on gateway.
//!
//! Holds everything that does not depend on HTTP: upload validation,
//! filename rules, the local fallback compositor, the on-disk upload store,
//! and the [`generation::ImageGenerator`] seam that remote backends implement.

pub mod composite;
pub mod error;
pub mod generation;
pub mod image_format;
pub mod naming;
pub mod storage;
