pub mod codec;
pub mod socket;

pub use codec::{validate_and_peek_tos, Probe, WireError, SIGNATURE, WIRE_LEN};
pub use socket::{RecvError, TosUdpSocket, MAX_RECV_LEN};
