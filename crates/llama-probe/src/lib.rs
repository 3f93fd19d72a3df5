pub mod result;
pub mod sender;
pub mod stats;

pub use result::ProbeResult;
pub use sender::Sender;
pub use stats::{reduce, Stats};
