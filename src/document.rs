//! Portable bundle documents
//!
//! A bundle travels between devices as a flat, versioned JSON document:
//! the version tag first, then the bundle fields in declaration order, so
//! two encodings of the same bundle are byte-identical and diff cleanly.
//! Timestamps are RFC 3339 in UTC. Decoding validates the version tag
//! before anything else is trusted.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::types::Bundle;

/// Version tag carried by every encoded document.
pub const DOCUMENT_VERSION: &str = "vitals.bundle.v1";

#[derive(Debug, Serialize, Deserialize)]
struct BundleEnvelope {
    document_version: String,
    #[serde(flatten)]
    bundle: Bundle,
}

/// Encodes a bundle as a pretty-printed, versioned JSON document.
pub fn encode(bundle: &Bundle) -> Result<String, EngineError> {
    let envelope = BundleEnvelope {
        document_version: DOCUMENT_VERSION.to_string(),
        bundle: bundle.clone(),
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Decodes a versioned JSON document back into a bundle.
///
/// # Returns
///
/// The bundle, or an error when the input is not valid JSON or carries a
/// version this engine does not understand.
pub fn decode(input: &str) -> Result<Bundle, EngineError> {
    let envelope: BundleEnvelope = serde_json::from_str(input)?;
    if envelope.document_version != DOCUMENT_VERSION {
        return Err(EngineError::MalformedDocument(format!(
            "unsupported document version: {}",
            envelope.document_version
        )));
    }
    Ok(envelope.bundle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate, GenerationRequest};
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn sample_bundle() -> Bundle {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(1);
        let request = GenerationRequest::new(start, end)
            .with_menstrual(true)
            .with_seed(3);
        generate(&request, None).expect("generate")
    }

    #[test]
    fn test_round_trip_preserves_bundle() {
        let bundle = sample_bundle();
        let encoded = encode(&bundle).expect("encode");
        let decoded = decode(&encoded).expect("decode");
        assert_eq!(decoded, bundle);
    }

    #[test]
    fn test_encoding_is_stable() {
        let bundle = sample_bundle();
        let first = encode(&bundle).expect("encode");
        let second = encode(&bundle).expect("encode");
        assert_eq!(first, second);
    }

    #[test]
    fn test_version_tag_leads_the_document() {
        let bundle = sample_bundle();
        let encoded = encode(&bundle).expect("encode");
        let head: String = encoded.chars().take(120).collect();
        assert!(head.contains("\"document_version\": \"vitals.bundle.v1\""));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let bundle = sample_bundle();
        let encoded = encode(&bundle).expect("encode");
        let tampered = encoded.replace("vitals.bundle.v1", "vitals.bundle.v9");
        match decode(&tampered) {
            Err(EngineError::MalformedDocument(message)) => {
                assert!(message.contains("vitals.bundle.v9"));
            }
            other => panic!("expected malformed document, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            decode("{ not json"),
            Err(EngineError::JsonError(_))
        ));
    }

    #[test]
    fn test_missing_version_rejected() {
        let json = "{\"bundle_id\": \"x\"}";
        assert!(decode(json).is_err());
    }
}
