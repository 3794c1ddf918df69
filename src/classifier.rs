//! Per-lot status classification from the detail page's status icon.
use log::{trace, warn};
use scraper::Html;

use crate::config::Site;
use crate::directory::detail_url_for;
use crate::error::{StatusUnavailable, UnavailableReason};
use crate::fetch::Fetch;
use crate::field::{extract, find_in_document, find_single, DestinationLocation};
use crate::status::{LotId, StatusCategory};

/// Status icon paths as served by the site.
const ICONS: [(&str, StatusCategory); 5] = [
    ("/pics/ParkingIcons/panui.png", StatusCategory::Available),
    ("/pics/ParkingIcons/meat.png", StatusCategory::Few),
    ("/pics/ParkingIcons/pail.png", StatusCategory::Active),
    ("/pics/ParkingIcons/male.png", StatusCategory::Full),
    ("/pics/ParkingIcons/sagur.png", StatusCategory::Closed),
];

/// Maps an icon reference to its category. Unrecognized references are kept verbatim.
pub fn category_for_icon(src: &str) -> StatusCategory {
    ICONS
        .iter()
        .find(|(icon, _)| *icon == src)
        .map(|(_, category)| category.clone())
        .unwrap_or_else(|| StatusCategory::Raw(String::from(src)))
}

pub struct Classifier<'a> {
    site: &'a Site,
}

impl<'a> Classifier<'a> {
    pub fn new(site: &'a Site) -> Self {
        Classifier { site }
    }

    /// Fetches the lot's detail page once and classifies it.
    pub fn classify(
        &self,
        fetcher: &dyn Fetch,
        id: &LotId,
    ) -> Result<StatusCategory, StatusUnavailable> {
        let url = detail_url_for(&self.site.detail_url, id);
        let body = fetcher.fetch(url.as_str()).map_err(|error| {
            warn!("{}", error);
            StatusUnavailable {
                id: id.clone(),
                reason: UnavailableReason::Fetch,
                fetch: Some(error),
            }
        })?;
        self.classify_page(id, &body)
    }

    pub fn classify_page(
        &self,
        id: &LotId,
        body: &str,
    ) -> Result<StatusCategory, StatusUnavailable> {
        let unavailable = |reason| StatusUnavailable {
            id: id.clone(),
            reason,
            fetch: None,
        };

        let html = Html::parse_document(body);
        let container = find_in_document(&html, &self.site.details)
            .ok_or_else(|| unavailable(UnavailableReason::MissingContainer))?;
        let indicator = find_single(&container, &self.site.indicator)
            .ok_or_else(|| unavailable(UnavailableReason::MissingIndicator))?;
        let src = extract(&indicator, &DestinationLocation::Attr(String::from("src")))
            .ok_or_else(|| unavailable(UnavailableReason::MissingSource))?;

        let category = category_for_icon(&src);
        if let StatusCategory::Raw(_) = category {
            warn!("lot {} shows unrecognized status icon {:?}", id, src);
        }
        trace!("lot {} is {}", id, category);
        Ok(category)
    }
}
