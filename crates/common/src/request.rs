//! Analysis request boundary and payload decoding.

use crate::error::{CopilotError, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde::{Deserialize, Serialize};

/// Maximum combined size of all request fields, in bytes.
pub const MAX_REQUEST_BYTES: usize = 1_000_000;

// Senders frequently strip the trailing '=' padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// How `transcript` and `notes` are encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    #[default]
    Base64,
    Plain,
}

/// One analysis request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub transcript: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(
        default,
        alias = "recordId",
        alias = "crmId",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_id: Option<String>,

    #[serde(default)]
    pub encoding: PayloadEncoding,
}

/// Decoded, validated inputs shared by every agent of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisInput {
    pub transcript: String,
    pub notes: String,
    pub record_id: String,
}

impl AnalysisRequest {
    /// A request whose payloads are plain text.
    pub fn plain(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            encoding: PayloadEncoding::Plain,
            ..Default::default()
        }
    }

    /// A request whose payloads are base64 text.
    pub fn base64(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            encoding: PayloadEncoding::Base64,
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    fn total_size(&self) -> usize {
        self.transcript.len()
            + self.notes.as_ref().map_or(0, String::len)
            + self.record_id.as_ref().map_or(0, String::len)
    }

    /// Validate and decode into agent inputs.
    ///
    /// Every failure here is an `InvalidRequest`; nothing downstream runs.
    pub fn decode(&self) -> Result<AnalysisInput> {
        if self.total_size() > MAX_REQUEST_BYTES {
            return Err(CopilotError::InvalidRequest(
                "Input too large: maximum total size is 1MB".into(),
            ));
        }

        if self.transcript.trim().is_empty() {
            return Err(CopilotError::InvalidRequest(
                "Missing required field: transcript".into(),
            ));
        }

        let transcript = decode_field("transcript", &self.transcript, self.encoding)?;
        if transcript.trim().is_empty() {
            return Err(CopilotError::InvalidRequest(
                "Transcript cannot be empty".into(),
            ));
        }

        let notes = match self.notes.as_deref() {
            Some(raw) if !raw.trim().is_empty() => decode_field("notes", raw, self.encoding)?,
            _ => String::new(),
        };

        let record_id = self
            .record_id
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        Ok(AnalysisInput {
            transcript,
            notes,
            record_id,
        })
    }
}

fn decode_field(field: &str, raw: &str, encoding: PayloadEncoding) -> Result<String> {
    match encoding {
        PayloadEncoding::Plain => Ok(raw.to_string()),
        PayloadEncoding::Base64 => {
            let compact: String = raw.split_whitespace().collect();
            let bytes = LENIENT_BASE64.decode(compact.as_bytes()).map_err(|e| {
                CopilotError::InvalidRequest(format!("Invalid base64 encoding in {field}: {e}"))
            })?;
            String::from_utf8(bytes).map_err(|_| {
                CopilotError::InvalidRequest(format!("{field} is not valid UTF-8 after decoding"))
            })
        }
    }
}

/// Encode text the way callers are expected to send it.
pub fn encode_payload(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_fields() {
        let request = AnalysisRequest::base64(encode_payload("Customer: rate limits hurt."))
            .with_notes(encode_payload("- Enterprise tier"))
            .with_record_id(" 12345 ");

        let input = request.decode().unwrap();
        assert_eq!(input.transcript, "Customer: rate limits hurt.");
        assert_eq!(input.notes, "- Enterprise tier");
        assert_eq!(input.record_id, "12345");
    }

    #[test]
    fn tolerates_missing_padding_and_line_breaks() {
        // "hello" encodes to "aGVsbG8="
        let request = AnalysisRequest::base64("aGVs\nbG8");
        assert_eq!(request.decode().unwrap().transcript, "hello");
    }

    #[test]
    fn rejects_invalid_base64() {
        let err = AnalysisRequest::base64("%%% not base64 %%%").decode().unwrap_err();
        assert!(matches!(err, CopilotError::InvalidRequest(ref m) if m.contains("transcript")));
    }

    #[test]
    fn rejects_non_utf8_payload() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([0xff, 0xfe, 0xfd]);
        let err = AnalysisRequest::base64(encoded).decode().unwrap_err();
        assert!(matches!(err, CopilotError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_invalid_notes_encoding() {
        let err = AnalysisRequest::base64(encode_payload("fine"))
            .with_notes("***")
            .decode()
            .unwrap_err();
        assert!(matches!(err, CopilotError::InvalidRequest(ref m) if m.contains("notes")));
    }

    #[test]
    fn rejects_empty_and_blank_transcripts() {
        assert!(AnalysisRequest::plain("").decode().is_err());
        assert!(AnalysisRequest::plain("   \n").decode().is_err());
        let blank_after_decode = AnalysisRequest::base64(encode_payload("   "));
        assert!(blank_after_decode.decode().is_err());
    }

    #[test]
    fn rejects_oversized_requests() {
        let big = "a".repeat(MAX_REQUEST_BYTES + 1);
        let err = AnalysisRequest::plain(big).decode().unwrap_err();
        assert!(matches!(err, CopilotError::InvalidRequest(ref m) if m.contains("too large")));
    }

    #[test]
    fn blank_notes_are_not_decoded() {
        let input = AnalysisRequest::base64(encode_payload("hi"))
            .with_notes("  ")
            .decode()
            .unwrap();
        assert!(input.notes.is_empty());
        assert!(input.record_id.is_empty());
    }

    #[test]
    fn accepts_legacy_field_names() {
        let json = r#"{"transcript": "aGk=", "notes": "", "crmId": "67890"}"#;
        let request: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.encoding, PayloadEncoding::Base64);
        assert_eq!(request.record_id.as_deref(), Some("67890"));

        let json = r#"{"transcript": "hi", "recordId": "1", "encoding": "plain"}"#;
        let request: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.decode().unwrap().transcript, "hi");
        assert_eq!(request.record_id.as_deref(), Some("1"));
    }
}
