//! Client message envelopes

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::vendor::AudioFrame;
use crate::{Error, Result};

/// Error text for frames that are not a JSON object or lack required fields
pub const INVALID_FORMAT: &str = "Invalid message format";

/// A parsed client frame: `{ "type": ..., "data"?: ..., "audio"?: ... }`
#[derive(Debug, Clone)]
pub struct ClientEnvelope {
    fields: Map<String, Value>,
}

impl ClientEnvelope {
    /// Parse a client text frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the frame is not a JSON object
    pub fn parse(frame: &str) -> Result<Self> {
        match serde_json::from_str(frame) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            _ => Err(Error::Protocol(INVALID_FORMAT.to_string())),
        }
    }

    /// The `type` tag, when it is a string
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    /// The `data` payload
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.field("data")
    }

    /// Any top-level field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Audio bytes as browsers send them: base64 text or a plain byte array
#[derive(Deserialize)]
#[serde(untagged)]
enum AudioPayload {
    Base64(String),
    Bytes(Vec<u8>),
}

/// Sample rate as clients send it: `16000`, `16000.0` or `"16000"`
#[derive(Deserialize)]
#[serde(untagged)]
enum SampleRate {
    Whole(u32),
    Fractional(f64),
    Text(String),
}

impl SampleRate {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn hz(self) -> Option<u32> {
        match self {
            Self::Whole(hz) => Some(hz),
            Self::Fractional(hz) => {
                let whole = hz.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&hz);
                whole.then_some(hz as u32)
            }
            Self::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Deserialize)]
struct RawAudioFrame {
    audio: AudioPayload,
    #[serde(default)]
    sample_rate: Option<SampleRate>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Read the `data` of an STT `audio` envelope
///
/// Fields other than `audio`, `sample_rate` and `encoding` are kept in
/// [`AudioFrame::extra`].
#[must_use]
pub fn audio_frame(data: &Value) -> Option<AudioFrame> {
    let raw = RawAudioFrame::deserialize(data).ok()?;
    let audio = match raw.audio {
        AudioPayload::Base64(text) => text,
        AudioPayload::Bytes(bytes) => STANDARD.encode(bytes),
    };
    let sample_rate = match raw.sample_rate {
        Some(rate) => Some(rate.hz()?),
        None => None,
    };
    let mut extra = raw.extra;
    // `data` is the vendor's name for the audio itself
    extra.remove("data");
    Some(AudioFrame {
        audio,
        sample_rate,
        encoding: raw.encoding,
        extra,
    })
}

/// `{ "type": "error", "error": ... }` sent to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Serialized form of the envelope
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({ "type": "error", "error": self.error }).to_string()
    }
}
