//! Encoding negotiation for a capture session.
//!
//! The gateway is asked, in priority order, whether it supports each known
//! (encoding, extension) pair; the first supported pair wins. When nothing
//! matches, the gateway's default encoding is used with the fallback
//! extension. The choice is fixed for the lifetime of the session.

use super::gateway::CaptureGateway;

/// One candidate encoding and the file extension its artifacts carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatChoice {
    pub mime: &'static str,
    pub extension: &'static str,
}

/// Candidate encodings, most preferred first.
pub const FORMAT_PRIORITY: [FormatChoice; 5] = [
    FormatChoice {
        mime: "audio/webm;codecs=opus",
        extension: "webm",
    },
    FormatChoice {
        mime: "audio/webm",
        extension: "webm",
    },
    FormatChoice {
        mime: "audio/mp4;codecs=mp4a",
        extension: "m4a",
    },
    FormatChoice {
        mime: "audio/ogg;codecs=opus",
        extension: "ogg",
    },
    FormatChoice {
        mime: "audio/ogg",
        extension: "ogg",
    },
];

/// Extension used when no candidate encoding is supported.
pub const FALLBACK_EXTENSION: &str = "webm";

/// MIME type assumed for artifacts when the gateway reported no encoding.
pub const DEFAULT_MIME: &str = "audio/webm";

/// The encoding selected for one capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedFormat {
    /// `None` when the gateway could not name its encoding.
    pub mime: Option<String>,
    pub extension: String,
}

impl Default for NegotiatedFormat {
    fn default() -> Self {
        Self {
            mime: None,
            extension: FALLBACK_EXTENSION.to_string(),
        }
    }
}

impl NegotiatedFormat {
    pub fn mime_or_default(&self) -> &str {
        self.mime.as_deref().unwrap_or(DEFAULT_MIME)
    }
}

/// Pick the session encoding from the gateway's capabilities.
pub fn negotiate(gateway: &dyn CaptureGateway) -> NegotiatedFormat {
    for choice in &FORMAT_PRIORITY {
        if gateway.is_format_supported(choice.mime) {
            return NegotiatedFormat {
                mime: Some(choice.mime.to_string()),
                extension: choice.extension.to_string(),
            };
        }
    }
    NegotiatedFormat {
        mime: gateway.default_encoding(),
        extension: FALLBACK_EXTENSION.to_string(),
    }
}
