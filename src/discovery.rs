use std::{collections::HashSet, fmt};

use itertools::Itertools as _;
use reqwest::Url;
use scraper::Html;
use tracing::{debug, info, warn};

use crate::{browser::WaitUntil, selector, Browser, Config};

pub const TRIP_LINK_SELECTOR: &str = r#"a[data-cy="trip-list-item-name"]"#;

/// URL of one trip detail page.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TripReference(Url);

impl From<Url> for TripReference {
    fn from(value: Url) -> Self {
        Self(value)
    }
}

impl AsRef<Url> for TripReference {
    fn as_ref(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for TripReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// What one listing page turned out to be.
#[derive(Debug)]
pub enum ListingPage {
    Trips(Vec<TripReference>),
    /// The page rendered without any trip, the end of the list.
    Empty,
    /// The page could not be loaded at all.
    Unavailable(anyhow::Error),
}

/// Trip links of a listing page, resolved against `base` and without duplicates.
pub fn extract_trip_links(html: &str, base: &Url) -> Vec<TripReference> {
    let document = Html::parse_document(html);
    document
        .select(selector!(r#"a[data-cy="trip-list-item-name"]"#))
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| match base.join(href.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!("Skip trip link {href:?} - {e}");
                None
            }
        })
        .unique()
        .map(TripReference::from)
        .collect()
}

pub async fn fetch_listing_page(
    browser: &dyn Browser,
    config: &Config,
    page_number: usize,
) -> ListingPage {
    let timing = &config.timing;
    let url = match config.listing_url(page_number) {
        Ok(url) => url,
        Err(e) => return ListingPage::Unavailable(e),
    };

    if let Err(e) = browser
        .navigate(&url, WaitUntil::Navigated, timing.navigation_timeout)
        .await
    {
        return ListingPage::Unavailable(e);
    }

    if let Err(e) = browser
        .wait_for_selector(TRIP_LINK_SELECTOR, timing.selector_timeout)
        .await
    {
        debug!("No trip cards on page {page_number} - {e}");
        return ListingPage::Empty;
    }
    tokio::time::sleep(timing.settle_delay).await;

    match browser.content().await {
        Ok(html) => {
            let links = extract_trip_links(&html, &url);
            if links.is_empty() {
                ListingPage::Empty
            } else {
                ListingPage::Trips(links)
            }
        }
        Err(e) => ListingPage::Unavailable(e),
    }
}

/// Walks the listing pages from 1 until one of them has no trip links.
///
/// A page listing exactly the same trips as the one before it also ends the walk, so a listing
/// that ignores the page index cannot loop forever. Pages that only overlap are kept going.
pub async fn discover_trips(browser: &dyn Browser, config: &Config) -> Vec<TripReference> {
    info!("Collecting trip URLs from all pages");

    let mut trips = Vec::new();
    let mut seen = HashSet::new();
    let mut previous = Vec::new();
    let mut page_number = 1;

    loop {
        info!("Scanning page {page_number}");
        match fetch_listing_page(browser, config, page_number).await {
            ListingPage::Trips(links) => {
                if links == previous {
                    warn!(
                        "Page {page_number} repeats page {}, stopping pagination",
                        page_number - 1
                    );
                    break;
                }
                let new_trips = links
                    .iter()
                    .filter(|link| seen.insert((*link).clone()))
                    .cloned()
                    .collect::<Vec<_>>();
                info!("Found {} new trips on page {page_number}", new_trips.len());
                trips.extend(new_trips);
                previous = links;
            }
            ListingPage::Empty => {
                info!("No trips found on page {page_number}, stopping pagination");
                break;
            }
            ListingPage::Unavailable(e) => {
                warn!("Failed to load page {page_number}, stopping pagination - {e:?}");
                break;
            }
        }

        page_number += 1;
        tokio::time::sleep(config.timing.page_delay).await;
    }

    info!(
        "Found {} total trips across {} page(s)",
        trips.len(),
        page_number - 1
    );
    trips
}
