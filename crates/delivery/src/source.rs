//! Campaign read seam. The backend query (status active, start date passed,
//! end date open or ahead) happens behind this trait; the engine re-applies
//! the full eligibility match locally either way.

use std::sync::Mutex;

use chrono::NaiveDate;

use geobooker_core::error::{DeliveryError, DeliveryResult};
use geobooker_core::types::{Campaign, CampaignStatus};

/// Read-only source of campaigns plausibly servable on a given date.
pub trait CampaignSource: Send + Sync {
    fn fetch_active(&self, today: NaiveDate) -> DeliveryResult<Vec<Campaign>>;
}

/// In-memory source for tests and the demo host; stands where the backend
/// read API plugs in.
#[derive(Default)]
pub struct InMemoryCampaignSource {
    campaigns: Mutex<Vec<Campaign>>,
}

impl InMemoryCampaignSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored campaign set.
    pub fn seed(&self, campaigns: Vec<Campaign>) {
        *self
            .campaigns
            .lock()
            .expect("campaign source mutex poisoned") = campaigns;
    }
}

impl CampaignSource for InMemoryCampaignSource {
    fn fetch_active(&self, today: NaiveDate) -> DeliveryResult<Vec<Campaign>> {
        let campaigns = self
            .campaigns
            .lock()
            .map_err(|_| DeliveryError::CampaignRead("campaign source mutex poisoned".into()))?;
        Ok(campaigns
            .iter()
            .filter(|c| c.status == CampaignStatus::Active)
            .filter(|c| c.start_date.map(|start| start <= today).unwrap_or(false))
            .filter(|c| c.end_date.map(|end| end >= today).unwrap_or(true))
            .cloned()
            .collect())
    }
}
