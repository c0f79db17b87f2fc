//! Datamosh - glitch a video by repeating predictive frames
//!
//! This library crate exposes the configuration and pipeline for integration
//! testing. The byte-level work lives in `datamosh-stream`, the ffmpeg side in
//! `datamosh-av`.

pub mod config;
pub mod pipeline;
