//! Streaming relay between browser WebSockets and vendor streaming APIs
//!
//! A single relay serves all three flavors. The flavor only changes which
//! client envelopes are accepted and which upstream call each one becomes;
//! the open/forward/teardown lifecycle is shared.
//!
//! ```text
//!  browser ──frames──▶ RelaySession ──UpstreamCommand──▶ vendor pump ──▶ vendor
//!  browser ◀──text──── RelaySession ◀──UpstreamEvent──── vendor pump ◀── vendor
//! ```

mod envelope;
mod flavor;
mod session;

pub use envelope::{ClientEnvelope, ErrorEnvelope, INVALID_FORMAT, audio_frame};
pub use flavor::Flavor;
pub use session::{RelayOutcome, RelaySession};
