//! Relay flavors and their client message vocabulary
//!
//! Each flavor has a small route table. A route says how to recognise a
//! client envelope and which upstream call it becomes. Frames that match no
//! route are rejected with the flavor's own error text.

use std::fmt;

use serde_json::Value;

use super::envelope::{ClientEnvelope, INVALID_FORMAT, audio_frame};
use crate::vendor::UpstreamCommand;
use crate::{Error, Result};

/// Which vendor streaming capability a relay session bridges to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Streaming speech-to-text
    Stt,
    /// Streaming text-to-speech
    Tts,
    /// Streaming speech-to-text with translation
    SttTranslate,
}

/// How a route recognises an envelope
#[derive(Debug, Clone, Copy)]
enum Selector {
    /// `type` equals the given tag
    Type(&'static str),
    /// The given field is present and truthy
    Field(&'static str),
}

type Build = fn(&ClientEnvelope) -> Result<UpstreamCommand>;

struct Route {
    selector: Selector,
    build: Build,
}

const STT_ROUTES: &[Route] = &[Route {
    selector: Selector::Type("audio"),
    build: transcribe,
}];

const TTS_ROUTES: &[Route] = &[
    Route {
        selector: Selector::Type("configureConnection"),
        build: configure,
    },
    Route {
        selector: Selector::Type("convert"),
        build: convert,
    },
    Route {
        selector: Selector::Type("flush"),
        build: flush,
    },
];

const TRANSLATE_ROUTES: &[Route] = &[Route {
    selector: Selector::Field("audio"),
    build: translate,
}];

fn transcribe(envelope: &ClientEnvelope) -> Result<UpstreamCommand> {
    envelope
        .data()
        .and_then(audio_frame)
        .map(UpstreamCommand::Transcribe)
        .ok_or_else(|| Error::Protocol(INVALID_FORMAT.to_string()))
}

fn configure(envelope: &ClientEnvelope) -> Result<UpstreamCommand> {
    Ok(UpstreamCommand::Configure(data_or_null(envelope)))
}

fn convert(envelope: &ClientEnvelope) -> Result<UpstreamCommand> {
    Ok(UpstreamCommand::Convert(data_or_null(envelope)))
}

#[allow(clippy::unnecessary_wraps)]
fn flush(_: &ClientEnvelope) -> Result<UpstreamCommand> {
    Ok(UpstreamCommand::Flush)
}

fn translate(envelope: &ClientEnvelope) -> Result<UpstreamCommand> {
    envelope
        .field("audio")
        .cloned()
        .map(UpstreamCommand::Translate)
        .ok_or_else(|| Error::Protocol(INVALID_FORMAT.to_string()))
}

fn data_or_null(envelope: &ClientEnvelope) -> Value {
    envelope.data().cloned().unwrap_or(Value::Null)
}

impl Selector {
    fn matches(self, envelope: &ClientEnvelope) -> bool {
        match self {
            Self::Type(tag) => envelope.kind() == Some(tag),
            Self::Field(name) => envelope.field(name).is_some_and(is_truthy),
        }
    }
}

/// Loose truthiness for JSON values: `null`, `false`, `0` and `""` are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl Flavor {
    /// All flavors, in route registration order
    pub const ALL: [Self; 3] = [Self::Stt, Self::Tts, Self::SttTranslate];

    /// Select a flavor from an upgrade request path
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.path() == path)
    }

    /// Upgrade path this flavor is served on
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Stt => "/api/streaming/transcribe",
            Self::Tts => "/api/streaming/tts",
            Self::SttTranslate => "/api/streaming/translate",
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stt => "stt",
            Self::Tts => "tts",
            Self::SttTranslate => "stt_translate",
        }
    }

    const fn routes(self) -> &'static [Route] {
        match self {
            Self::Stt => STT_ROUTES,
            Self::Tts => TTS_ROUTES,
            Self::SttTranslate => TRANSLATE_ROUTES,
        }
    }

    /// Error text sent when an envelope matches no route
    const fn rejection(self) -> &'static str {
        match self {
            Self::Stt => r#"Only type "audio" is supported for STT streaming."#,
            Self::Tts => INVALID_FORMAT,
            Self::SttTranslate => "Only audio messages are supported for STT translation streaming.",
        }
    }

    /// Turn one client text frame into an upstream call
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] carrying the text to send back to the
    /// client when the frame is malformed or not accepted by this flavor
    pub fn interpret(self, frame: &str) -> Result<UpstreamCommand> {
        let envelope = ClientEnvelope::parse(frame)?;
        let route = self
            .routes()
            .iter()
            .find(|route| route.selector.matches(&envelope))
            .ok_or_else(|| Error::Protocol(self.rejection().to_string()))?;
        (route.build)(&envelope)
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
