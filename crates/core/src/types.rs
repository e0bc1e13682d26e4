use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Lifecycle status of a campaign. All transitions are owned by the backend;
/// the delivery engine only ever reads this field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    PendingReview,
    Active,
    Paused,
    Completed,
    Rejected,
}

/// Targeting scope of a campaign — the ad level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdLevel {
    Global,
    Country,
    City,
}

impl AdLevel {
    /// Rotation priority: global campaigns are shown ahead of country-level,
    /// country ahead of city.
    pub fn priority_rank(&self) -> u8 {
        match self {
            AdLevel::Global => 1,
            AdLevel::Country => 2,
            AdLevel::City => 3,
        }
    }
}

/// Creative file extensions treated as video.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "m4v", "ogv", "ogg"];

/// An advertising campaign: the creative plus its targeting and schedule
/// metadata, as read from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Backend row id. Rows occasionally arrive without one; such campaigns
    /// still render and navigate but produce no attribution events.
    pub id: Option<String>,
    pub advertiser_name: String,
    pub headline: String,
    pub description: String,
    /// Image or video creative. A campaign without one is never served.
    pub creative_url: Option<String>,
    pub cta_text: Option<String>,
    pub cta_url: Option<String>,
    pub ad_level: AdLevel,
    #[serde(default)]
    pub target_countries: Vec<String>,
    #[serde(default)]
    pub target_cities: Vec<String>,
    pub status: CampaignStatus,
    /// Schedule window, inclusive on both ends. A missing start date makes
    /// the campaign never eligible.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Declared video duration in seconds, when the backend knows it.
    #[serde(default)]
    pub video_duration_secs: Option<f64>,
}

impl Campaign {
    /// True iff the creative URL points at a video file. The extension is
    /// taken from the URL path, so query strings and fragments don't confuse
    /// the check.
    pub fn is_video(&self) -> bool {
        let Some(creative) = self.creative_url.as_deref() else {
            return false;
        };
        let path = match Url::parse(creative) {
            Ok(url) => url.path().to_ascii_lowercase(),
            // Relative storage paths still carry the extension.
            Err(_) => creative.to_ascii_lowercase(),
        };
        match path.rsplit_once('.') {
            Some((_, ext)) => VIDEO_EXTENSIONS.contains(&ext),
            None => false,
        }
    }
}

/// Where the viewer is, resolved once per session by the geolocation step
/// and passed explicitly into matching and recording. `None` means the
/// lookup failed or was skipped; unknown viewers only match global campaigns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewerContext {
    pub country: Option<String>,
    pub city: Option<String>,
}

impl ViewerContext {
    pub fn new(country: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            country: Some(country.into()),
            city: Some(city.into()),
        }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    /// Wire label for the recording API: the literal `unknown` when absent.
    pub fn country_label(&self) -> &str {
        self.country.as_deref().unwrap_or("unknown")
    }

    pub fn city_label(&self) -> &str {
        self.city.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    /// Classify by viewport width: anything narrower than the breakpoint
    /// counts as mobile.
    pub fn from_viewport_width(width_px: u32, breakpoint_px: u32) -> Self {
        if width_px < breakpoint_px {
            DeviceClass::Mobile
        } else {
            DeviceClass::Desktop
        }
    }
}

/// A credited "was shown" event for one campaign during one rotation slot.
/// Built by the controller, enriched and forwarded by the recorder, never
/// mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpressionEvent {
    pub event_id: Uuid,
    pub campaign_id: String,
    pub country: String,
    pub city: String,
    pub device: DeviceClass,
    pub timestamp: DateTime<Utc>,
}

impl ImpressionEvent {
    pub fn new(
        campaign_id: impl Into<String>,
        viewer: &ViewerContext,
        device: DeviceClass,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            campaign_id: campaign_id.into(),
            country: viewer.country_label().to_string(),
            city: viewer.city_label().to_string(),
            device,
            timestamp: Utc::now(),
        }
    }
}

/// A click-through on a campaign's call to action. One event per activation;
/// repeated clicks are real and are not deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickEvent {
    pub event_id: Uuid,
    pub campaign_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ClickEvent {
    pub fn new(campaign_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            campaign_id: campaign_id.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_campaign() -> Campaign {
        Campaign {
            id: Some("cmp-1".into()),
            advertiser_name: "Tacos El Norte".into(),
            headline: "Lunch special".into(),
            description: "Two for one".into(),
            creative_url: Some("https://cdn.example.com/ads/lunch.jpg".into()),
            cta_text: Some("Order now".into()),
            cta_url: Some("https://tacos.example.com".into()),
            ad_level: AdLevel::City,
            target_countries: vec!["MX".into()],
            target_cities: vec!["Monterrey".into()],
            status: CampaignStatus::Active,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: None,
            video_duration_secs: None,
        }
    }

    #[test]
    fn test_is_video_by_extension() {
        let mut campaign = image_campaign();
        assert!(!campaign.is_video());

        campaign.creative_url = Some("https://cdn.example.com/ads/spot.mp4".into());
        assert!(campaign.is_video());

        campaign.creative_url = Some("https://cdn.example.com/ads/spot.WEBM".into());
        assert!(campaign.is_video());
    }

    #[test]
    fn test_is_video_ignores_query_string() {
        let mut campaign = image_campaign();
        campaign.creative_url =
            Some("https://cdn.example.com/ads/spot.mp4?token=abc&v=.jpg".into());
        assert!(campaign.is_video());

        campaign.creative_url = Some("https://cdn.example.com/ads/photo.png?name=clip.mp4".into());
        assert!(!campaign.is_video());
    }

    #[test]
    fn test_is_video_without_creative() {
        let mut campaign = image_campaign();
        campaign.creative_url = None;
        assert!(!campaign.is_video());
    }

    #[test]
    fn test_device_class_breakpoint() {
        assert_eq!(
            DeviceClass::from_viewport_width(767, 768),
            DeviceClass::Mobile
        );
        assert_eq!(
            DeviceClass::from_viewport_width(768, 768),
            DeviceClass::Desktop
        );
    }

    #[test]
    fn test_unknown_viewer_labels() {
        let viewer = ViewerContext::unknown();
        assert_eq!(viewer.country_label(), "unknown");
        assert_eq!(viewer.city_label(), "unknown");

        let viewer = ViewerContext::new("MX", "Monterrey");
        assert_eq!(viewer.country_label(), "MX");
        assert_eq!(viewer.city_label(), "Monterrey");
    }

    #[test]
    fn test_campaign_status_serde() {
        let json = serde_json::to_string(&CampaignStatus::PendingReview).unwrap();
        assert_eq!(json, "\"pending_review\"");
        let parsed: CampaignStatus = serde_json::from_str("\"active\"").unwrap();
        assert_eq!(parsed, CampaignStatus::Active);
    }

    #[test]
    fn test_ad_level_priority() {
        assert!(AdLevel::Global.priority_rank() < AdLevel::Country.priority_rank());
        assert!(AdLevel::Country.priority_rank() < AdLevel::City.priority_rank());
    }

    #[test]
    fn test_impression_event_carries_viewer_labels() {
        let viewer = ViewerContext::new("MX", "Monterrey");
        let event = ImpressionEvent::new("cmp-1", &viewer, DeviceClass::Mobile);
        assert_eq!(event.campaign_id, "cmp-1");
        assert_eq!(event.country, "MX");
        assert_eq!(event.city, "Monterrey");

        let event = ImpressionEvent::new("cmp-1", &ViewerContext::unknown(), DeviceClass::Desktop);
        assert_eq!(event.country, "unknown");
        assert_eq!(event.city, "unknown");
    }
}
