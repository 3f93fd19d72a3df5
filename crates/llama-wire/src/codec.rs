//! The LLAMA probe datagram: a fixed, 36-byte, little-endian frame.
//!
//! ```text
//! offset  size  field
//! 0       10    signature, "__llama__" null-padded
//! 10      1     tos
//! 11      8     sent_ms   (f64)
//! 19      8     rcvd_ms   (f64)
//! 27      8     rtt_ms    (f64)
//! 35      1     lost      (bool, 0 or 1)
//! ```

use bytes::{Buf, BufMut, BytesMut};

/// ASCII signature, null-padded to 10 bytes, used to reject foreign datagrams.
pub const SIGNATURE: &[u8; 10] = b"__llama__\0";

/// Total length of a probe frame on the wire.
pub const WIRE_LEN: usize = 36;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WireError {
    #[error("expected a {WIRE_LEN}-byte probe frame, got {0}")]
    BadLength(usize),
    #[error("signature mismatch, not a LLAMA probe")]
    BadSignature,
    #[error("lost byte was neither 0 nor 1: {0}")]
    BadLostByte(u8),
}

/// A decoded probe frame.
///
/// On the wire, `rcvd_ms`, `rtt_ms` and `lost` are always zero — they are
/// filled in by the sender once the reflected datagram comes back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub tos: u8,
    pub sent_ms: f64,
    pub rcvd_ms: f64,
    pub rtt_ms: f64,
    pub lost: bool,
}

impl Probe {
    /// Builds the frame a sender puts on the wire: signature, `tos`, `sent_ms`,
    /// and zeroed receive-side fields.
    pub fn encode(tos: u8, sent_ms: f64) -> [u8; WIRE_LEN] {
        let mut buf = BytesMut::with_capacity(WIRE_LEN);
        buf.put_slice(SIGNATURE);
        buf.put_u8(tos);
        buf.put_f64_le(sent_ms);
        buf.put_f64_le(0.0); // rcvd_ms
        buf.put_f64_le(0.0); // rtt_ms
        buf.put_u8(0); // lost

        buf.as_ref().try_into().expect("buffer is exactly WIRE_LEN bytes")
    }

    /// Parses a received frame. The reflector never calls this — it treats
    /// the payload as opaque bytes — this is a sender/test-only operation.
    pub fn decode(mut bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.len() != WIRE_LEN {
            return Err(WireError::BadLength(bytes.len()));
        }

        let mut signature = [0u8; 10];
        bytes.copy_to_slice(&mut signature);
        if &signature != SIGNATURE {
            return Err(WireError::BadSignature);
        }

        let tos = bytes.get_u8();
        let sent_ms = bytes.get_f64_le();
        let rcvd_ms = bytes.get_f64_le();
        let rtt_ms = bytes.get_f64_le();
        let lost = match bytes.get_u8() {
            0 => false,
            1 => true,
            other => return Err(WireError::BadLostByte(other)),
        };

        Ok(Probe {
            tos,
            sent_ms,
            rcvd_ms,
            rtt_ms,
            lost,
        })
    }
}

/// Validates that `bytes` is a well-formed LLAMA frame and returns its `tos`
/// byte, without touching (or even parsing) the embedded timestamps.
///
/// This is what the reflector uses: it must echo the payload back
/// byte-for-byte, so it never round-trips the frame through [`Probe`].
pub fn validate_and_peek_tos(bytes: &[u8]) -> Result<u8, WireError> {
    if bytes.len() != WIRE_LEN {
        return Err(WireError::BadLength(bytes.len()));
    }
    if &bytes[..10] != SIGNATURE {
        return Err(WireError::BadSignature);
    }
    match bytes[35] {
        0 | 1 => {}
        other => return Err(WireError::BadLostByte(other)),
    }

    Ok(bytes[10])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let frame = Probe::encode(0x2e, 1_700_000_000_000.0);
        assert_eq!(frame.len(), WIRE_LEN);
        assert_eq!(&frame[..10], SIGNATURE);

        let probe = Probe::decode(&frame).unwrap();
        assert_eq!(probe.tos, 0x2e);
        assert_eq!(probe.sent_ms, 1_700_000_000_000.0);
        assert_eq!(probe.rcvd_ms, 0.0);
        assert_eq!(probe.rtt_ms, 0.0);
        assert!(!probe.lost);
    }

    #[test]
    fn rejects_mismatched_signature() {
        let mut frame = Probe::encode(0, 0.0);
        frame[0] = b'X';

        assert_eq!(Probe::decode(&frame), Err(WireError::BadSignature));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(Probe::decode(&[0u8; 20]), Err(WireError::BadLength(20)));
    }

    #[test]
    fn rejects_bad_lost_byte() {
        let mut frame = Probe::encode(0, 0.0);
        frame[35] = 7;

        assert_eq!(Probe::decode(&frame), Err(WireError::BadLostByte(7)));
    }

    #[test]
    fn validate_and_peek_tos_reads_tos_without_touching_timestamps() {
        let frame = Probe::encode(0xb8, 1_234.5);
        assert_eq!(validate_and_peek_tos(&frame), Ok(0xb8));
    }

    #[test]
    fn validate_and_peek_tos_rejects_foreign_datagrams() {
        let frame = [0u8; 20];
        assert_eq!(validate_and_peek_tos(&frame), Err(WireError::BadLength(20)));
    }

    #[test]
    fn tos_is_honored_across_the_full_byte_range() {
        for tos in [0u8, 1, 0x2e, 0xb8, 0xff] {
            let frame = Probe::encode(tos, 42.0);
            let probe = Probe::decode(&frame).unwrap();
            assert_eq!(probe.tos, tos);
        }
    }
}
