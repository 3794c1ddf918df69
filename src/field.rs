use scraper::ElementRef;
use scraper::Html;
use scraper::Selector;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq)]
/// Selects what to extract from the HTML element.
pub enum DestinationLocation {
    /// Extract the element's attribute. (eg. to extract the link from `<a href=...></a>`, the
    /// argument is href).
    Attr(String),
    /// Extract text, trimmed of surrounding whitespace. (eg. HELLO from `<a> HELLO </a>`)
    Text,
}

/// Compiles a CSS selector, reporting the offending string on failure.
pub fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|error| ConfigError::Selector {
        selector: String::from(selector),
        message: format!("{:?}", error),
    })
}

/// First element of the document matching `selector`.
pub fn find_in_document<'a>(html: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    html.select(selector).next()
}

/// First descendant of `element` matching `selector`.
pub fn find_single<'a>(element: &ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

pub fn find_all<'a>(element: &ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    element.select(selector).collect()
}

/// Extracts a value from the element. A missing attribute yields `None`; text is
/// always present, though possibly empty.
pub fn extract(element: &ElementRef, location: &DestinationLocation) -> Option<String> {
    match location {
        DestinationLocation::Text => Some(element.text().collect::<String>().trim().to_string()),
        DestinationLocation::Attr(attr) => element.value().attr(attr).map(String::from),
    }
}
