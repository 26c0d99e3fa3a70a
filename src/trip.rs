use anyhow::Context;
use scraper::{ElementRef, Html};
use tracing::{debug, info};

use crate::{browser::WaitUntil, discovery::TripReference, selector, Browser, Timing};

pub const TRIP_DATE_SELECTOR: &str = r#"[data-cy="trip-date-span"]"#;
pub const UNKNOWN_TRIP: &str = "Unknown Trip";

const VISIBLE_TEXT_SCRIPT: &str = r#"(() => {
    const main = document.querySelector('main, [role="main"], .container');
    return main ? main.innerText : document.body.innerText;
})()"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripPageContent {
    pub name: String,
    /// Visible text of the page.
    pub transcript: String,
}

impl TripPageContent {
    /// The first `max_chars` characters of the transcript.
    pub fn bounded_transcript(&self, max_chars: usize) -> &str {
        match self.transcript.char_indices().nth(max_chars) {
            Some((end, _)) => &self.transcript[..end],
            None => &self.transcript,
        }
    }
}

fn first_text(element: Option<ElementRef<'_>>) -> Option<String> {
    let text = element?.text().collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

pub fn trip_name_from_html(html: &str) -> String {
    let document = Html::parse_document(html);
    first_text(document.select(selector!("h1")).next())
        .or_else(|| {
            first_text(
                document
                    .select(selector!(r#"[data-cy="trip-list-item-name"]"#))
                    .next(),
            )
        })
        .or_else(|| first_text(document.select(selector!(r#"a[class*="tripName"]"#)).next()))
        .unwrap_or_else(|| UNKNOWN_TRIP.to_string())
}

pub async fn fetch_trip(
    browser: &dyn Browser,
    trip: &TripReference,
    timing: &Timing,
) -> anyhow::Result<TripPageContent> {
    info!("Visiting: {trip}");
    browser
        .navigate(trip.as_ref(), WaitUntil::Navigated, timing.navigation_timeout)
        .await
        .context("Failed to open trip page")?;
    browser
        .wait_for_selector(TRIP_DATE_SELECTOR, timing.selector_timeout)
        .await
        .context("Trip content did not show up")?;
    tokio::time::sleep(timing.settle_delay).await;

    let html = browser.content().await.context("Failed to read trip page")?;
    let name = trip_name_from_html(&html);
    info!("Trip name: {name}");

    let transcript = match browser.evaluate(VISIBLE_TEXT_SCRIPT).await? {
        serde_json::Value::String(text) => text,
        other => anyhow::bail!("Unexpected page text - {other}"),
    };
    debug!("Text length: {}", transcript.chars().count());

    Ok(TripPageContent { name, transcript })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_comes_from_the_heading_first() {
        let html = r#"
            <h1>  Thanksgiving in Pittsburgh </h1>
            <a data-cy="trip-list-item-name">Other</a>
        "#;
        assert_eq!(trip_name_from_html(html), "Thanksgiving in Pittsburgh");
    }

    #[test]
    fn name_falls_back_through_the_selectors() {
        let html = r#"<h1> </h1><a class="sc-tripName-x1">Tokyo Spring</a>"#;
        assert_eq!(trip_name_from_html(html), "Tokyo Spring");

        let html = r#"<h1></h1><span data-cy="trip-list-item-name">Lisbon</span>"#;
        assert_eq!(trip_name_from_html(html), "Lisbon");

        assert_eq!(trip_name_from_html("<main></main>"), UNKNOWN_TRIP);
    }

    #[test]
    fn transcript_is_bounded_by_characters() {
        let content = TripPageContent {
            name: "Trip".to_string(),
            transcript: "SFO → PIT".to_string(),
        };
        assert_eq!(content.bounded_transcript(5), "SFO →");
        assert_eq!(content.bounded_transcript(100), "SFO → PIT");
        assert_eq!(content.bounded_transcript(0), "");
    }
}
