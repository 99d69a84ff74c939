//! Stream packets
//!
//! When live vitals cross a peer link, each sample travels as a framed
//! record: a 4-byte big-endian length prefix followed by a JSON body. The
//! codec here only frames and unframes; connection lifecycle belongs to
//! the transport layer. Decoding is incremental so a receiver can peel
//! packets off the front of a buffer as bytes arrive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::scenario::StreamScenario;
use crate::stream::VitalsPoint;
use crate::types::SOURCE_STREAMED;

/// Upper bound on a packet body. Anything larger is a framing error, not
/// a legitimate vitals record.
pub const MAX_PACKET_BYTES: usize = 1 << 20;

/// One framed vitals record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamPacket {
    /// Emission time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Heart rate (bpm), absent when the tick carried none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
    /// SDNN (milliseconds), absent when the tick carried none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hrv: Option<f64>,
    /// Scenario active when the sample was produced
    pub scenario: StreamScenario,
    /// Provenance of the sample
    pub source: String,
}

impl StreamPacket {
    /// Wraps an emitted vitals pair for transport.
    pub fn from_point(point: &VitalsPoint, scenario: StreamScenario) -> Self {
        StreamPacket {
            timestamp: point.timestamp,
            heart_rate: Some(point.heart_rate),
            hrv: Some(point.hrv),
            scenario,
            source: SOURCE_STREAMED.to_string(),
        }
    }

    /// Encodes the packet as a length-prefixed frame.
    pub fn encode(&self) -> Result<Vec<u8>, EngineError> {
        let body = serde_json::to_vec(self)?;
        if body.len() > MAX_PACKET_BYTES {
            return Err(EngineError::MalformedPacket(format!(
                "packet body of {} bytes exceeds the {} byte cap",
                body.len(),
                MAX_PACKET_BYTES
            )));
        }
        let mut frame = Vec::with_capacity(4 + body.len());
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(&body);
        Ok(frame)
    }

    /// Decodes one packet from the front of a buffer.
    ///
    /// # Returns
    ///
    /// The packet and the number of bytes consumed, so the caller can
    /// advance its buffer. Fails when the prefix or body is truncated,
    /// the declared length exceeds the cap, or the body is not a valid
    /// record.
    pub fn decode(buffer: &[u8]) -> Result<(StreamPacket, usize), EngineError> {
        if buffer.len() < 4 {
            return Err(EngineError::MalformedPacket(format!(
                "truncated length prefix: {} of 4 bytes",
                buffer.len()
            )));
        }
        let mut prefix = [0u8; 4];
        prefix.copy_from_slice(&buffer[..4]);
        let length = u32::from_be_bytes(prefix) as usize;
        if length > MAX_PACKET_BYTES {
            return Err(EngineError::MalformedPacket(format!(
                "declared body of {} bytes exceeds the {} byte cap",
                length, MAX_PACKET_BYTES
            )));
        }
        if buffer.len() < 4 + length {
            return Err(EngineError::MalformedPacket(format!(
                "truncated body: {} of {} bytes",
                buffer.len() - 4,
                length
            )));
        }
        let packet = serde_json::from_slice(&buffer[4..4 + length])?;
        Ok((packet, 4 + length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_packet() -> StreamPacket {
        StreamPacket {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            heart_rate: Some(72.5),
            hrv: Some(48.0),
            scenario: StreamScenario::Normal,
            source: SOURCE_STREAMED.to_string(),
        }
    }

    #[test]
    fn test_round_trip() {
        let packet = sample_packet();
        let frame = packet.encode().expect("encode");
        let (decoded, consumed) = StreamPacket::decode(&frame).expect("decode");
        assert_eq!(decoded, packet);
        assert_eq!(consumed, frame.len());
    }

    #[test]
    fn test_from_point_carries_both_values() {
        let point = VitalsPoint {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            heart_rate: 88.0,
            hrv: 41.0,
        };
        let packet = StreamPacket::from_point(&point, StreamScenario::Stress);
        assert_eq!(packet.heart_rate, Some(88.0));
        assert_eq!(packet.hrv, Some(41.0));
        assert_eq!(packet.source, SOURCE_STREAMED);
    }

    #[test]
    fn test_decode_leaves_following_bytes() {
        let first = sample_packet();
        let mut second = sample_packet();
        second.heart_rate = Some(99.0);

        let mut buffer = first.encode().expect("encode");
        buffer.extend(second.encode().expect("encode"));

        let (decoded_first, consumed) = StreamPacket::decode(&buffer).expect("decode first");
        assert_eq!(decoded_first, first);
        let (decoded_second, rest) =
            StreamPacket::decode(&buffer[consumed..]).expect("decode second");
        assert_eq!(decoded_second, second);
        assert_eq!(consumed + rest, buffer.len());
    }

    #[test]
    fn test_truncated_prefix_rejected() {
        assert!(matches!(
            StreamPacket::decode(&[0, 0]),
            Err(EngineError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_truncated_body_rejected() {
        let frame = sample_packet().encode().expect("encode");
        let cut = &frame[..frame.len() - 3];
        assert!(matches!(
            StreamPacket::decode(cut),
            Err(EngineError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_oversized_declared_length_rejected() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&u32::MAX.to_be_bytes());
        frame.extend_from_slice(b"xxxx");
        assert!(matches!(
            StreamPacket::decode(&frame),
            Err(EngineError::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_invalid_body_rejected() {
        let body = b"not json";
        let mut frame = Vec::new();
        frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
        frame.extend_from_slice(body);
        assert!(matches!(
            StreamPacket::decode(&frame),
            Err(EngineError::JsonError(_))
        ));
    }
}
