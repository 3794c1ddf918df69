//! Discovery of the known lots from the site's listing page.
use log::{debug, info};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::config::Site;
use crate::error::DirectoryError;
use crate::fetch::Fetch;
use crate::field::{extract, find_all, find_in_document, DestinationLocation};
use crate::status::{LotId, NameDirectory};

lazy_static! {
    static ref ANCHOR: Selector = Selector::parse("a[href]").unwrap();
}

/// Resolves the lot-name directory from the listing page.
pub struct DirectoryResolver<'a> {
    site: &'a Site,
}

impl<'a> DirectoryResolver<'a> {
    pub fn new(site: &'a Site) -> Self {
        DirectoryResolver { site }
    }

    /// Fetches the listing page once and extracts every lot link in it.
    pub fn resolve(&self, fetcher: &dyn Fetch) -> Result<NameDirectory, DirectoryError> {
        let body = fetcher.fetch(self.site.listing_url.as_str())?;
        let directory = self.parse(&body)?;
        info!("discovered {} lots", directory.len());
        Ok(directory)
    }

    pub fn parse(&self, body: &str) -> Result<NameDirectory, DirectoryError> {
        let html = Html::parse_document(body);
        let container = find_in_document(&html, &self.site.listing).ok_or_else(|| {
            DirectoryError::Malformed {
                url: self.site.listing_url.to_string(),
                selector: self.site.config.listing_selector.clone(),
            }
        })?;

        let mut directory = NameDirectory::new();
        for link in find_all(&container, &ANCHOR) {
            match self.parse_lot_link(&link) {
                Some((id, name)) => {
                    directory.insert(id, name);
                }
                None => debug!("skipping non-lot link {:?}", link.value().attr("href")),
            }
        }
        Ok(directory)
    }

    fn parse_lot_link(&self, link: &ElementRef) -> Option<(LotId, String)> {
        let href = extract(link, &DestinationLocation::Attr(String::from("href")))?;
        let target = self.site.listing_url.join(href.trim()).ok()?;
        let id = lot_id_from_detail_url(&self.site.detail_url, &target)?;
        let name = extract(link, &DestinationLocation::Text)?;
        if name.is_empty() {
            return None;
        }
        Some((id, name))
    }
}

/// Id of a link pointing at the detail page, i.e. same origin and path with an
/// all-digit `ID` query parameter.
pub fn lot_id_from_detail_url(detail_url: &Url, target: &Url) -> Option<LotId> {
    if target.scheme() != detail_url.scheme()
        || target.host_str() != detail_url.host_str()
        || target.path() != detail_url.path()
    {
        return None;
    }
    target
        .query_pairs()
        .find(|(key, _)| key == "ID")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
        .map(LotId::new)
}

/// Builds the detail page URL for one lot.
pub fn detail_url_for(detail_url: &Url, id: &LotId) -> Url {
    let mut url = detail_url.clone();
    url.query_pairs_mut().clear().append_pair("ID", id.as_str());
    url
}
