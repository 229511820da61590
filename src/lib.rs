//! Debate Gateway - backend for the debate practice app
//!
//! This library provides:
//! - A streaming relay bridging browser WebSockets to the speech vendor's
//!   streaming STT, TTS and translation APIs
//! - Batch transcription and synthesis endpoints
//! - A debate room broadcast socket
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  Browser client                      │
//! │  REST  │  /api/streaming/*  │  /api/debate/room      │
//! └────────────────────┬────────────────────────────────┘
//!                      │  one listener
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Debate Gateway                       │
//! │   api  │  relay (per-socket sessions)  │  room       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Sarvam AI (vendor)                      │
//! │   STT  │  TTS  │  STT + translate  (REST + WS)       │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod relay;
pub mod room;
pub mod vendor;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use config::{Config, SarvamConfig};
pub use error::{Error, Result};
pub use relay::{ErrorEnvelope, Flavor, RelayOutcome, RelaySession};
pub use room::{RoomHub, RoomPayload};
pub use vendor::{
    AudioFrame, AudioUpload, BatchSpeech, SarvamClient, UpstreamCommand, UpstreamConnector,
    UpstreamEvent, UpstreamHandle, UpstreamPeer,
};
