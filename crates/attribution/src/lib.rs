//! Attribution — best-effort forwarding of impression and click events to
//! the external event ledger. At-most-once from this side: a failed or
//! overflowing delivery is logged and dropped, never retried.

pub mod recorder;
pub mod transport;

pub use recorder::AttributionRecorder;
pub use transport::{
    capture_transport, noop_transport, CaptureTransport, EventTransport, LoggingTransport,
    NoOpTransport,
};
