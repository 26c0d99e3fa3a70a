#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use clap::Parser as _;
use reqwest::Url;
use trip_flights::{
    completion, discovery::TRIP_LINK_SELECTOR, trip::TRIP_DATE_SELECTOR, Browser, Completion,
    CompletionError, Config, LoginGate, Timing, WaitUntil,
};

pub fn config(output: &Path) -> Config {
    let output = output.to_string_lossy().into_owned();
    let mut config = Config::parse_from([
        "trip-flights",
        "--api-key",
        "sk-ant-test",
        "--output",
        output.as_str(),
    ]);
    config.timing = Timing::immediate();
    config
}

pub fn listing_url(page: usize) -> String {
    format!("https://www.tripit.com/app/trips?trips_filter=past&page={page}")
}

pub fn trip_url(id: &str) -> String {
    format!("https://www.tripit.com/app/trips/{id}")
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub html: String,
    pub text: Option<String>,
    pub markers: Vec<&'static str>,
}

/// A listing page with one trip card per id.
pub fn listing_page(ids: &[&str]) -> FakePage {
    let html = ids
        .iter()
        .map(|id| format!(r#"<a data-cy="trip-list-item-name" href="/app/trips/{id}">{id}</a>"#))
        .collect::<String>();
    FakePage {
        html: format!("<html><body><main>{html}</main></body></html>"),
        text: None,
        markers: vec![TRIP_LINK_SELECTOR],
    }
}

pub fn trip_page(name: &str, text: &str) -> FakePage {
    FakePage {
        html: format!(
            r#"<html><body><h1>{name}</h1><span data-cy="trip-date-span">Nov 6</span></body></html>"#
        ),
        text: Some(text.to_string()),
        markers: vec![TRIP_DATE_SELECTOR],
    }
}

#[derive(Default)]
pub struct FakeBrowser {
    pages: HashMap<String, FakePage>,
    unreachable: HashSet<String>,
    current: Mutex<Option<String>>,
    visits: Mutex<Vec<(String, WaitUntil)>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, page: FakePage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    pub fn with_unreachable(mut self, url: impl Into<String>) -> Self {
        self.unreachable.insert(url.into());
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn visits_with_wait(&self) -> Vec<(String, WaitUntil)> {
        self.visits.lock().unwrap().clone()
    }

    fn current_page(&self) -> Option<FakePage> {
        let current = self.current.lock().unwrap();
        current.as_ref().and_then(|url| self.pages.get(url).cloned())
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(
        &self,
        url: &Url,
        wait_until: WaitUntil,
        _timeout: Duration,
    ) -> anyhow::Result<()> {
        let url = url.to_string();
        self.visits.lock().unwrap().push((url.clone(), wait_until));
        if self.unreachable.contains(&url) {
            anyhow::bail!("net::ERR_CONNECTION_RESET at {url}");
        }
        *self.current.lock().unwrap() = Some(url);
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> anyhow::Result<()> {
        match self.current_page() {
            Some(page) if page.markers.iter().any(|marker| *marker == selector) => Ok(()),
            _ => anyhow::bail!("The event waited for never came - {selector}"),
        }
    }

    async fn content(&self) -> anyhow::Result<String> {
        Ok(self
            .current_page()
            .map(|page| page.html)
            .unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }

    async fn evaluate(&self, _script: &str) -> anyhow::Result<serde_json::Value> {
        Ok(self
            .current_page()
            .and_then(|page| page.text)
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null))
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Answers prompts mentioning a trip name with a canned response, everything else with `[]`.
#[derive(Default)]
pub struct FakeCompletion {
    responses: Vec<(String, String)>,
    failing: bool,
    prompts: Mutex<Vec<(String, u32)>>,
}

impl FakeCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_response(mut self, trip_name: &str, response: &str) -> Self {
        self.responses
            .push((format!("Trip Name: {trip_name}\n"), response.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completion for FakeCompletion {
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> completion::Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_output_tokens));
        if self.failing {
            return Err(CompletionError::Api {
                status: 529,
                message: "overloaded_error - Overloaded".to_string(),
            });
        }

        Ok(self
            .responses
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| "[]".to_string()))
    }
}

#[derive(Default)]
pub struct AutoGate {
    confirmed: AtomicUsize,
}

impl AutoGate {
    pub fn confirmations(&self) -> usize {
        self.confirmed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LoginGate for AutoGate {
    async fn confirm(&self) -> anyhow::Result<()> {
        self.confirmed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
