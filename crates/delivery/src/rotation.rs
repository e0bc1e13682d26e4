//! Banner rotation state machine. Timing, visibility, and user input enter
//! as stimuli; everything outward (timers to arm, events to record, URLs to
//! open) leaves as effects. The host adapter around it owns the real timers,
//! so the machine itself runs the same under tests and production.

use serde::{Deserialize, Serialize};

use geobooker_core::config::RotationConfig;
use geobooker_core::types::Campaign;

/// External inputs to the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stimulus {
    /// The rotation timer fired.
    Tick,
    /// The ad region crossed the visibility threshold, in either direction.
    VisibilityChanged(bool),
    /// Video playback position for the current slot, in seconds.
    VideoTimeUpdated(f64),
    /// An arming timer scheduled via [`Effect::StartArmingTimer`] elapsed.
    ArmingElapsed { generation: u64 },
    /// The viewer pressed skip.
    UserSkip,
    /// The viewer activated the creative or its call-to-action.
    UserActivate,
}

/// Outward instructions produced by a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Start the impression arming timer for the current slot. A later
    /// [`Stimulus::ArmingElapsed`] must echo the generation to count.
    StartArmingTimer { generation: u64 },
    /// Cancel the pending arming timer.
    CancelArmingTimer,
    RecordImpression { campaign_id: String },
    RecordClick { campaign_id: String },
    /// Open the click-through destination. Emitted on every activation with
    /// a CTA URL, whether or not a click was recorded.
    OpenUrl { url: String },
}

/// State for one banner instance: the eligible list, the rotation cursor,
/// and the per-slot video/impression sub-state. Each instance owns its
/// cursor exclusively; the host event loop serializes all transitions.
#[derive(Debug, Clone)]
pub struct RotationController {
    rotation: RotationConfig,
    campaigns: Vec<Campaign>,
    current: usize,
    elapsed_video_secs: f64,
    can_skip: bool,
    impression_armed: bool,
    visible: bool,
    /// Bumped whenever a pending arming timer must stop counting — on slot
    /// change, list change, or visibility loss. A stale `ArmingElapsed`
    /// carries an old generation and is ignored.
    arming_generation: u64,
    arming_pending: bool,
}

impl RotationController {
    pub fn new(rotation: RotationConfig) -> Self {
        Self {
            rotation,
            campaigns: Vec::new(),
            current: 0,
            elapsed_video_secs: 0.0,
            can_skip: false,
            impression_armed: false,
            visible: false,
            arming_generation: 0,
            arming_pending: false,
        }
    }

    /// Replace the eligible list. A change in content resets the cursor to
    /// the first slot with fresh sub-state; a content-identical refresh
    /// keeps the cursor where it is.
    pub fn set_campaigns(&mut self, campaigns: Vec<Campaign>) -> Vec<Effect> {
        let same = self.campaigns.len() == campaigns.len()
            && self.campaigns.iter().zip(&campaigns).all(|(a, b)| a.id == b.id);
        self.campaigns = campaigns;
        if same {
            return Vec::new();
        }
        self.current = 0;
        self.reset_slot_state()
    }

    /// The campaign currently holding the slot, if any.
    pub fn current(&self) -> Option<&Campaign> {
        self.campaigns.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// True when there is nothing to display.
    pub fn is_idle(&self) -> bool {
        self.campaigns.is_empty()
    }

    pub fn can_skip(&self) -> bool {
        self.can_skip
    }

    pub fn elapsed_video_secs(&self) -> f64 {
        self.elapsed_video_secs
    }

    /// Whether the current video creative loops within its slot: only when
    /// its declared duration is at or under the loop ceiling.
    pub fn video_should_loop(&self) -> bool {
        self.current()
            .and_then(|c| c.video_duration_secs)
            .map(|d| d <= self.rotation.video_loop_max_seconds)
            .unwrap_or(false)
    }

    /// Feed one stimulus through the transition function.
    pub fn apply(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        match stimulus {
            Stimulus::Tick => self.advance(false),
            Stimulus::UserSkip => self.advance(true),
            Stimulus::VisibilityChanged(visible) => self.on_visibility(visible),
            Stimulus::VideoTimeUpdated(secs) => {
                self.on_video_time(secs);
                Vec::new()
            }
            Stimulus::ArmingElapsed { generation } => self.on_arming_elapsed(generation),
            Stimulus::UserActivate => self.on_activate(),
        }
    }

    /// Rotate to the next slot. Skip requests additionally require the
    /// skip gate to be open; both are no-ops with fewer than two campaigns.
    fn advance(&mut self, user_skip: bool) -> Vec<Effect> {
        if self.campaigns.len() <= 1 {
            return Vec::new();
        }
        if user_skip && !self.can_skip {
            return Vec::new();
        }
        self.current = (self.current + 1) % self.campaigns.len();
        self.reset_slot_state()
    }

    /// Fresh sub-state for the slot that just became current. A banner that
    /// is already on screen starts arming immediately: the new slot has not
    /// been credited yet.
    fn reset_slot_state(&mut self) -> Vec<Effect> {
        self.elapsed_video_secs = 0.0;
        self.can_skip = false;
        self.impression_armed = false;
        self.arming_generation += 1;

        let mut effects = Vec::new();
        if self.arming_pending {
            self.arming_pending = false;
            effects.push(Effect::CancelArmingTimer);
        }
        if self.visible && !self.campaigns.is_empty() {
            self.arming_pending = true;
            effects.push(Effect::StartArmingTimer {
                generation: self.arming_generation,
            });
        }
        effects
    }

    fn on_visibility(&mut self, visible: bool) -> Vec<Effect> {
        let was_visible = self.visible;
        self.visible = visible;

        if visible && !was_visible {
            if self.impression_armed || self.campaigns.is_empty() {
                return Vec::new();
            }
            self.arming_generation += 1;
            self.arming_pending = true;
            return vec![Effect::StartArmingTimer {
                generation: self.arming_generation,
            }];
        }

        if !visible && was_visible && self.arming_pending {
            self.arming_pending = false;
            self.arming_generation += 1;
            return vec![Effect::CancelArmingTimer];
        }

        Vec::new()
    }

    /// Track video playback for the current slot; the skip gate opens once
    /// playback passes the threshold and stays open until the slot changes.
    fn on_video_time(&mut self, secs: f64) {
        let is_video = self.current().map(|c| c.is_video()).unwrap_or(false);
        if !is_video {
            return;
        }
        self.elapsed_video_secs = secs;
        if secs >= self.rotation.skip_after_seconds {
            self.can_skip = true;
        }
    }

    fn on_arming_elapsed(&mut self, generation: u64) -> Vec<Effect> {
        // A timer from a previous slot or visibility spell carries an old
        // generation.
        if generation != self.arming_generation || !self.arming_pending {
            return Vec::new();
        }
        self.arming_pending = false;
        if !self.visible || self.impression_armed {
            return Vec::new();
        }
        self.impression_armed = true;
        match self.current().and_then(|c| c.id.clone()) {
            Some(campaign_id) => vec![Effect::RecordImpression { campaign_id }],
            // Nothing to attribute without a campaign id.
            None => Vec::new(),
        }
    }

    /// Activation always navigates when a CTA URL exists; recording is
    /// skipped for id-less rows and never gates the navigation.
    fn on_activate(&mut self) -> Vec<Effect> {
        let Some(campaign) = self.current() else {
            return Vec::new();
        };
        let Some(url) = campaign.cta_url.clone() else {
            return Vec::new();
        };
        let mut effects = Vec::new();
        if let Some(campaign_id) = campaign.id.clone() {
            effects.push(Effect::RecordClick { campaign_id });
        }
        effects.push(Effect::OpenUrl { url });
        effects
    }
}
