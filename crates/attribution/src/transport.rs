//! Event transports — where impression and click events leave the process.
//!
//! The recorder worker calls a transport once per event; failures are the
//! worker's to log and drop.

use std::sync::{Arc, Mutex};

use tracing::debug;

use geobooker_core::types::{ClickEvent, ImpressionEvent};

/// Delivery seam for the external event ledger.
pub trait EventTransport: Send + Sync {
    fn send_impression(&self, event: &ImpressionEvent) -> anyhow::Result<()>;
    fn send_click(&self, event: &ClickEvent) -> anyhow::Result<()>;
}

/// Discards everything. For modules that run without a ledger.
pub struct NoOpTransport;

impl EventTransport for NoOpTransport {
    fn send_impression(&self, _event: &ImpressionEvent) -> anyhow::Result<()> {
        Ok(())
    }

    fn send_click(&self, _event: &ClickEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// In-memory transport that captures events for testing.
#[derive(Default)]
pub struct CaptureTransport {
    impressions: Mutex<Vec<ImpressionEvent>>,
    clicks: Mutex<Vec<ClickEvent>>,
}

impl CaptureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn impressions(&self) -> Vec<ImpressionEvent> {
        self.impressions
            .lock()
            .expect("capture transport mutex poisoned")
            .clone()
    }

    pub fn clicks(&self) -> Vec<ClickEvent> {
        self.clicks
            .lock()
            .expect("capture transport mutex poisoned")
            .clone()
    }

    pub fn impression_count(&self) -> usize {
        self.impressions
            .lock()
            .expect("capture transport mutex poisoned")
            .len()
    }

    pub fn click_count(&self) -> usize {
        self.clicks
            .lock()
            .expect("capture transport mutex poisoned")
            .len()
    }
}

impl EventTransport for CaptureTransport {
    fn send_impression(&self, event: &ImpressionEvent) -> anyhow::Result<()> {
        self.impressions
            .lock()
            .expect("capture transport mutex poisoned")
            .push(event.clone());
        Ok(())
    }

    fn send_click(&self, event: &ClickEvent) -> anyhow::Result<()> {
        self.clicks
            .lock()
            .expect("capture transport mutex poisoned")
            .push(event.clone());
        Ok(())
    }
}

/// Logs each event instead of delivering it; stands where the backend
/// recording call plugs in.
pub struct LoggingTransport;

impl EventTransport for LoggingTransport {
    fn send_impression(&self, event: &ImpressionEvent) -> anyhow::Result<()> {
        debug!(
            campaign_id = %event.campaign_id,
            country = %event.country,
            city = %event.city,
            device = ?event.device,
            "impression delivered"
        );
        Ok(())
    }

    fn send_click(&self, event: &ClickEvent) -> anyhow::Result<()> {
        debug!(campaign_id = %event.campaign_id, "click delivered");
        Ok(())
    }
}

/// Convenience: a no-op transport as a trait object.
pub fn noop_transport() -> Arc<dyn EventTransport> {
    Arc::new(NoOpTransport)
}

/// Convenience: a capture transport for tests.
pub fn capture_transport() -> Arc<CaptureTransport> {
    Arc::new(CaptureTransport::new())
}
