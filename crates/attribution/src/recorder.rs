//! Attribution recorder — non-blocking, at-most-once forwarding of
//! impression and click events. Uses a channel-based architecture so
//! callers never wait on delivery; rotation and playback are never gated
//! on the ledger.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::warn;

use geobooker_core::config::RecorderConfig;
use geobooker_core::types::{ClickEvent, DeviceClass, ImpressionEvent, ViewerContext};

use crate::transport::EventTransport;

/// One queued delivery job.
#[derive(Debug, Clone)]
enum RecordJob {
    Impression(ImpressionEvent),
    Click(ClickEvent),
}

/// Fire-and-forget recorder. `record_*` calls enrich, enqueue, and return
/// immediately; a background worker delivers each job once. Overflow and
/// transport failure are logged and dropped — there is no local queue
/// persistence and no retry.
pub struct AttributionRecorder {
    sender: mpsc::Sender<RecordJob>,
    viewer: ViewerContext,
}

impl AttributionRecorder {
    /// Create the recorder and spawn its delivery worker. Must be called
    /// within a tokio runtime.
    pub fn new(
        transport: Arc<dyn EventTransport>,
        viewer: ViewerContext,
        config: &RecorderConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<RecordJob>(config.queue_capacity);
        tokio::spawn(run_worker(transport, receiver));
        Self { sender, viewer }
    }

    /// Queue an impression for `campaign_id`, enriched with the cached
    /// viewer location and the device class. Never blocks.
    pub fn record_impression(&self, campaign_id: &str, device: DeviceClass) {
        let event = ImpressionEvent::new(campaign_id, &self.viewer, device);
        self.enqueue(RecordJob::Impression(event));
    }

    /// Queue a click event for `campaign_id`. Never blocks.
    pub fn record_click(&self, campaign_id: &str) {
        self.enqueue(RecordJob::Click(ClickEvent::new(campaign_id)));
    }

    fn enqueue(&self, job: RecordJob) {
        if let Err(e) = self.sender.try_send(job) {
            metrics::counter!("attribution.dropped").increment(1);
            warn!("attribution event dropped: {}", e);
        } else {
            metrics::counter!("attribution.queued").increment(1);
        }
    }
}

/// Drain the queue until every sender is gone, delivering each job once.
async fn run_worker(transport: Arc<dyn EventTransport>, mut receiver: mpsc::Receiver<RecordJob>) {
    while let Some(job) = receiver.recv().await {
        deliver(transport.as_ref(), &job);
    }
}

/// A failed delivery is logged and dropped, never retried; the displayed
/// banner already moved on regardless.
fn deliver(transport: &dyn EventTransport, job: &RecordJob) {
    let result = match job {
        RecordJob::Impression(event) => transport.send_impression(event),
        RecordJob::Click(event) => transport.send_click(event),
    };
    if let Err(e) = result {
        metrics::counter!("attribution.failed").increment(1);
        warn!(error = %e, "attribution delivery failed, event lost");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{capture_transport, CaptureTransport};
    use anyhow::anyhow;

    struct FailingTransport;

    impl EventTransport for FailingTransport {
        fn send_impression(&self, _event: &ImpressionEvent) -> anyhow::Result<()> {
            Err(anyhow!("ledger unavailable"))
        }

        fn send_click(&self, _event: &ClickEvent) -> anyhow::Result<()> {
            Err(anyhow!("ledger unavailable"))
        }
    }

    fn sample_impression() -> ImpressionEvent {
        ImpressionEvent::new(
            "cmp-1",
            &ViewerContext::new("MX", "Monterrey"),
            DeviceClass::Mobile,
        )
    }

    #[test]
    fn test_deliver_forwards_to_transport() {
        let transport = CaptureTransport::new();
        deliver(&transport, &RecordJob::Impression(sample_impression()));
        deliver(&transport, &RecordJob::Click(ClickEvent::new("cmp-1")));

        assert_eq!(transport.impression_count(), 1);
        assert_eq!(transport.click_count(), 1);
        assert_eq!(transport.impressions()[0].country, "MX");
    }

    #[test]
    fn test_deliver_swallows_transport_failure() {
        // Must not panic or propagate.
        deliver(&FailingTransport, &RecordJob::Impression(sample_impression()));
        deliver(&FailingTransport, &RecordJob::Click(ClickEvent::new("cmp-1")));
    }

    #[tokio::test]
    async fn test_worker_drains_queue_in_order() {
        let transport = capture_transport();
        let (sender, receiver) = mpsc::channel(8);

        sender
            .try_send(RecordJob::Impression(sample_impression()))
            .unwrap();
        sender
            .try_send(RecordJob::Click(ClickEvent::new("cmp-1")))
            .unwrap();
        sender
            .try_send(RecordJob::Click(ClickEvent::new("cmp-2")))
            .unwrap();
        drop(sender);

        run_worker(transport.clone(), receiver).await;

        assert_eq!(transport.impression_count(), 1);
        assert_eq!(transport.click_count(), 2);
        assert_eq!(transport.clicks()[0].campaign_id, "cmp-1");
        assert_eq!(transport.clicks()[1].campaign_id, "cmp-2");
    }

    #[tokio::test]
    async fn test_recorder_enriches_impressions() {
        let transport = capture_transport();
        let recorder = AttributionRecorder::new(
            transport.clone(),
            ViewerContext::new("MX", "Guadalajara"),
            &RecorderConfig::default(),
        );

        recorder.record_impression("cmp-9", DeviceClass::Desktop);
        drop(recorder);

        // The worker exits once the sender side is gone; poll until it has
        // drained the queue.
        for _ in 0..100 {
            if transport.impression_count() == 1 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let impressions = transport.impressions();
        assert_eq!(impressions.len(), 1);
        assert_eq!(impressions[0].campaign_id, "cmp-9");
        assert_eq!(impressions[0].country, "MX");
        assert_eq!(impressions[0].city, "Guadalajara");
        assert_eq!(impressions[0].device, DeviceClass::Desktop);
    }
}
