//! The decoded, in-memory shape of a single probe round-trip.

use llama_wire::Probe;

/// A single probe's outcome. Identical in shape to the wire [`Probe`], but
/// with `rcvd_ms`/`rtt_ms` filled in by the sender (or `lost` synthesized on
/// timeout, with the other numeric fields left at zero).
pub type ProbeResult = Probe;

pub(crate) fn lost(tos: u8, sent_ms: f64) -> ProbeResult {
    ProbeResult {
        tos,
        sent_ms,
        rcvd_ms: 0.0,
        rtt_ms: 0.0,
        lost: true,
    }
}

pub(crate) fn ok(tos: u8, reply: Probe, rcvd_ms: f64) -> ProbeResult {
    ProbeResult {
        tos,
        sent_ms: reply.sent_ms,
        rcvd_ms,
        rtt_ms: rcvd_ms - reply.sent_ms,
        lost: false,
    }
}
