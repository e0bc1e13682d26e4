//! Campaign eligibility matching — the pure filtering/ordering step that
//! reduces the full campaign set to those servable for one viewer and date.

use chrono::NaiveDate;
use geobooker_core::types::{AdLevel, Campaign, CampaignStatus, ViewerContext};

/// Filter `campaigns` down to those servable to `viewer` on `today`, ordered
/// for rotation. Pure function: no clock reads, no side effects. When the
/// upstream read already failed, callers pass nothing and get nothing —
/// ads degrade to absent, never to an error.
pub fn eligible_campaigns(
    campaigns: &[Campaign],
    today: NaiveDate,
    viewer: &ViewerContext,
) -> Vec<Campaign> {
    let mut eligible: Vec<Campaign> = campaigns
        .iter()
        .filter(|c| c.creative_url.is_some())
        .filter(|c| schedule_eligible(c, today))
        .filter(|c| location_matches(c, viewer))
        .cloned()
        .collect();
    // Stable sort: upstream relative order survives within each level.
    eligible.sort_by_key(|c| c.ad_level.priority_rank());
    eligible
}

/// Active and inside the inclusive schedule window. A missing start date
/// makes the campaign never eligible.
pub fn schedule_eligible(campaign: &Campaign, today: NaiveDate) -> bool {
    if campaign.status != CampaignStatus::Active {
        return false;
    }
    let Some(start) = campaign.start_date else {
        return false;
    };
    if start > today {
        return false;
    }
    match campaign.end_date {
        Some(end) => end >= today,
        None => true,
    }
}

/// Location targeting per ad level. Unknown viewer fields only ever match
/// global campaigns.
pub fn location_matches(campaign: &Campaign, viewer: &ViewerContext) -> bool {
    match campaign.ad_level {
        AdLevel::Global => true,
        AdLevel::Country => match viewer.country.as_deref() {
            Some(country) => campaign.target_countries.iter().any(|t| t == country),
            None => false,
        },
        AdLevel::City => match viewer.city.as_deref() {
            Some(city) => campaign.target_cities.iter().any(|t| city_matches(t, city)),
            None => false,
        },
    }
}

/// Case-insensitive plain substring match in both directions, so a stored
/// "Ciudad de Mexico Centro" matches a viewer in "Mexico". No locale or
/// accent normalization; a target of "York" also matches a viewer in
/// "New York".
pub fn city_matches(target: &str, viewer_city: &str) -> bool {
    let target = target.to_lowercase();
    let viewer_city = viewer_city.to_lowercase();
    target.contains(&viewer_city) || viewer_city.contains(&target)
}
