//! Configuration management for the debate gateway
//!
//! Everything is read from the process environment. `main` loads a `.env`
//! file first (via `dotenvy`), so local development can keep the vendor key
//! out of the shell.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::{Error, Result};

/// Default HTTP port, matching the legacy backend
pub const DEFAULT_PORT: u16 = 4000;

/// Debate gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the single HTTP/WebSocket listener binds to
    pub port: u16,

    /// Path to the built web UI, served as a fallback when set
    pub static_dir: Option<PathBuf>,

    /// Speech vendor configuration
    pub sarvam: SarvamConfig,
}

/// Sarvam AI connection and model configuration
#[derive(Debug, Clone)]
pub struct SarvamConfig {
    /// API subscription key (from `SARVAM_API_KEY`)
    pub api_key: SecretString,

    /// REST base URL
    pub base_url: String,

    /// Streaming (WebSocket) base URL
    pub ws_base_url: String,

    /// Language code for streaming and batch transcription
    pub stt_language: String,

    /// Model for batch transcription
    pub stt_model: String,

    /// Model for streaming text-to-speech
    pub tts_model: String,

    /// Target language for canned coaching replies
    pub tts_language: String,

    /// Model for streaming speech translation
    pub translate_model: String,
}

impl SarvamConfig {
    /// Build a vendor config with default endpoints and models
    #[must_use]
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            base_url: "https://api.sarvam.ai".to_string(),
            ws_base_url: "wss://api.sarvam.ai".to_string(),
            stt_language: "hi-IN".to_string(),
            stt_model: "saarika:v2.5".to_string(),
            tts_model: "bulbul:v2".to_string(),
            tts_language: "hi-IN".to_string(),
            translate_model: "saaras:v2.5".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Reads from:
    /// - `SARVAM_API_KEY`: vendor subscription key (required)
    /// - `PORT`: listener port (default: 4000)
    /// - `SARVAM_BASE_URL`, `SARVAM_WS_BASE_URL`: vendor endpoints
    /// - `DEBATE_STT_LANGUAGE`, `DEBATE_STT_MODEL`, `DEBATE_TTS_MODEL`,
    ///   `DEBATE_TTS_LANGUAGE`, `DEBATE_TRANSLATE_MODEL`: model overrides
    /// - `DEBATE_STATIC_DIR`: web UI directory
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the port is not a number
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the port is not a number
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("SARVAM_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("SARVAM_API_KEY is not set".to_string()))?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid PORT {raw:?}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let mut sarvam = SarvamConfig::new(SecretString::from(api_key));
        let overrides: [(&str, &mut String); 7] = [
            ("SARVAM_BASE_URL", &mut sarvam.base_url),
            ("SARVAM_WS_BASE_URL", &mut sarvam.ws_base_url),
            ("DEBATE_STT_LANGUAGE", &mut sarvam.stt_language),
            ("DEBATE_STT_MODEL", &mut sarvam.stt_model),
            ("DEBATE_TTS_MODEL", &mut sarvam.tts_model),
            ("DEBATE_TTS_LANGUAGE", &mut sarvam.tts_language),
            ("DEBATE_TRANSLATE_MODEL", &mut sarvam.translate_model),
        ];
        for (key, slot) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }

        Ok(Self {
            port,
            static_dir: lookup("DEBATE_STATIC_DIR").map(PathBuf::from),
            sarvam,
        })
    }
}
