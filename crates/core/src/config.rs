use serde::Deserialize;

/// Root delivery configuration. Loaded from environment variables with the
/// prefix `GEOBOOKER__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub rotation: RotationConfig,
    #[serde(default)]
    pub impression: ImpressionConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

/// Rotation and video playback knobs for one banner instance.
#[derive(Debug, Clone, Deserialize)]
pub struct RotationConfig {
    /// How long each campaign holds the slot before the next rotates in.
    #[serde(default = "default_rotation_interval_ms")]
    pub interval_ms: u64,
    /// Video playback time after which the viewer may skip ahead.
    #[serde(default = "default_skip_after_seconds")]
    pub skip_after_seconds: f64,
    /// Videos at or under this declared duration loop within their slot.
    #[serde(default = "default_video_loop_max_seconds")]
    pub video_loop_max_seconds: f64,
    /// Content-policy ceiling on creative duration. Advisory only; nothing
    /// in the engine enforces it.
    #[serde(default = "default_max_creative_seconds")]
    pub max_creative_seconds: f64,
}

/// When a displayed ad becomes a countable impression.
#[derive(Debug, Clone, Deserialize)]
pub struct ImpressionConfig {
    /// Fraction of the ad region that must be on screen.
    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f64,
    /// Continuous visible time before the impression is credited.
    #[serde(default = "default_min_visible_ms")]
    pub min_visible_ms: u64,
    /// Viewports narrower than this are classified as mobile.
    #[serde(default = "default_mobile_breakpoint_px")]
    pub mobile_breakpoint_px: u32,
}

/// Periodic re-read of the eligible campaign list.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub interval_secs: u64,
}

/// Attribution recorder queue sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

// Default functions
fn default_rotation_interval_ms() -> u64 {
    8000
}
fn default_skip_after_seconds() -> f64 {
    7.0
}
fn default_video_loop_max_seconds() -> f64 {
    6.0
}
fn default_max_creative_seconds() -> f64 {
    15.0
}
fn default_visibility_threshold() -> f64 {
    0.5
}
fn default_min_visible_ms() -> u64 {
    1000
}
fn default_mobile_breakpoint_px() -> u32 {
    768
}
fn default_refresh_interval_secs() -> u64 {
    300
}
fn default_queue_capacity() -> usize {
    1024
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_rotation_interval_ms(),
            skip_after_seconds: default_skip_after_seconds(),
            video_loop_max_seconds: default_video_loop_max_seconds(),
            max_creative_seconds: default_max_creative_seconds(),
        }
    }
}

impl Default for ImpressionConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: default_visibility_threshold(),
            min_visible_ms: default_min_visible_ms(),
            mobile_breakpoint_px: default_mobile_breakpoint_px(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rotation: RotationConfig::default(),
            impression: ImpressionConfig::default(),
            refresh: RefreshConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("GEOBOOKER")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
