//! Banner host — the thin async adapter around one [`RotationController`].
//! Owns the rotation ticker, the campaign refresh ticker, the single
//! in-flight impression arming timer, and the external stimulus stream, and
//! forwards record effects to the attribution recorder. When the host task
//! ends, every timer goes down with it.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use geobooker_attribution::AttributionRecorder;
use geobooker_core::config::{ImpressionConfig, RefreshConfig, RotationConfig};
use geobooker_core::types::{DeviceClass, ViewerContext};

use crate::matcher::eligible_campaigns;
use crate::rotation::{Effect, RotationController, Stimulus};
use crate::source::CampaignSource;

pub struct BannerHost {
    controller: RotationController,
    source: Arc<dyn CampaignSource>,
    recorder: AttributionRecorder,
    viewer: ViewerContext,
    device: DeviceClass,
    rotation_interval: Duration,
    refresh_interval: Duration,
    min_visible: Duration,
    /// Generation and deadline of the pending arming timer, if any.
    arming_deadline: Option<(u64, Instant)>,
}

impl BannerHost {
    pub fn new(
        rotation: RotationConfig,
        impression: &ImpressionConfig,
        refresh: &RefreshConfig,
        source: Arc<dyn CampaignSource>,
        recorder: AttributionRecorder,
        viewer: ViewerContext,
        viewport_width_px: u32,
    ) -> Self {
        let device =
            DeviceClass::from_viewport_width(viewport_width_px, impression.mobile_breakpoint_px);
        Self {
            rotation_interval: Duration::from_millis(rotation.interval_ms),
            refresh_interval: Duration::from_secs(refresh.interval_secs),
            min_visible: Duration::from_millis(impression.min_visible_ms),
            controller: RotationController::new(rotation),
            source,
            recorder,
            viewer,
            device,
            arming_deadline: None,
        }
    }

    /// Drive the banner until the stimulus channel closes. The refresh
    /// ticker fires immediately on entry, so the first eligible list loads
    /// before the first rotation.
    pub async fn run(mut self, mut stimuli: mpsc::Receiver<Stimulus>) {
        let mut rotation = time::interval(self.rotation_interval);
        rotation.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        let mut refresh = time::interval(self.refresh_interval);
        refresh.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            let arming = self.arming_deadline;
            tokio::select! {
                _ = refresh.tick() => {
                    self.refresh_campaigns();
                }
                _ = rotation.tick() => {
                    let effects = self.controller.apply(Stimulus::Tick);
                    self.handle_effects(effects);
                }
                generation = arming_elapsed(arming) => {
                    self.arming_deadline = None;
                    let effects = self.controller.apply(Stimulus::ArmingElapsed { generation });
                    self.handle_effects(effects);
                }
                stimulus = stimuli.recv() => {
                    let Some(stimulus) = stimulus else { break };
                    let effects = self.controller.apply(stimulus);
                    self.handle_effects(effects);
                }
            }
        }
        debug!("banner host stopped");
    }

    /// Re-read the campaign list and re-match it for this viewer. A failed
    /// fetch degrades to an empty eligible list; the next refresh recovers.
    fn refresh_campaigns(&mut self) {
        let today = Utc::now().date_naive();
        let matched = match self.source.fetch_active(today) {
            Ok(campaigns) => eligible_campaigns(&campaigns, today, &self.viewer),
            Err(e) => {
                warn!(error = %e, "campaign fetch failed, clearing eligible list");
                Vec::new()
            }
        };
        debug!(eligible = matched.len(), "campaign list refreshed");
        let effects = self.controller.set_campaigns(matched);
        self.handle_effects(effects);
    }

    fn handle_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartArmingTimer { generation } => {
                    self.arming_deadline = Some((generation, Instant::now() + self.min_visible));
                }
                Effect::CancelArmingTimer => {
                    self.arming_deadline = None;
                }
                Effect::RecordImpression { campaign_id } => {
                    self.recorder.record_impression(&campaign_id, self.device);
                }
                Effect::RecordClick { campaign_id } => {
                    self.recorder.record_click(&campaign_id);
                }
                Effect::OpenUrl { url } => {
                    // Opening a browsing context belongs to the embedding
                    // surface; the host only surfaces the destination.
                    info!(%url, "click-through");
                }
            }
        }
    }
}

/// Resolve with the timer's generation once the deadline passes; never
/// resolve while no timer is pending.
async fn arming_elapsed(deadline: Option<(u64, Instant)>) -> u64 {
    match deadline {
        Some((generation, at)) => {
            time::sleep_until(at).await;
            generation
        }
        None => future::pending().await,
    }
}
