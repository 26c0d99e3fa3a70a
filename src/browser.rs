use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use headless_chrome::{LaunchOptions, Tab};
use reqwest::Url;
use tracing::{debug, info};

use crate::flatten_error;

/// How long `navigate` blocks after the request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// Return as soon as the navigation has been committed.
    Committed,
    /// Return once the frame has stopped loading.
    Navigated,
}

/// The pieces of a browser the exporter drives.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&self, url: &Url, wait_until: WaitUntil, timeout: Duration)
        -> anyhow::Result<()>;

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> anyhow::Result<()>;

    /// Serialized DOM of the current page.
    async fn content(&self) -> anyhow::Result<String>;

    async fn evaluate(&self, script: &str) -> anyhow::Result<serde_json::Value>;

    async fn close(&self) -> anyhow::Result<()>;
}

pub struct ChromeBrowser {
    // dropping the browser kills a launched Chrome, so it lives as long as the tab
    _browser: headless_chrome::Browser,
    tab: Arc<Tab>,
}

impl ChromeBrowser {
    /// Connects to `browser_ws` when given, otherwise launches a new Chrome.
    pub fn open(browser_ws: Option<&str>, headless: bool) -> anyhow::Result<Self> {
        let browser = if let Some(browser_ws) = browser_ws {
            info!("Connect to browser at {browser_ws}");
            headless_chrome::Browser::connect(browser_ws.to_string())?
        } else {
            info!("Launch browser (headless: {headless})");
            let options = LaunchOptions::default_builder()
                .headless(headless)
                .window_size(Some((1280, 960)))
                // the operator may take a while to log in
                .idle_browser_timeout(Duration::from_secs(60 * 60))
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build launch options - {e}"))?;
            headless_chrome::Browser::new(options)?
        };
        let tab = browser.new_tab()?;

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    async fn with_tab<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = self.tab.clone();
        flatten_error(
            tokio::task::spawn_blocking(move || f(&tab))
                .await
                .map_err(|e| anyhow::anyhow!("join error - {e:?}")),
        )
    }
}

#[async_trait]
impl Browser for ChromeBrowser {
    async fn navigate(
        &self,
        url: &Url,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> anyhow::Result<()> {
        let url = url.to_string();
        self.with_tab(move |tab| {
            debug!("navigate to {url}");
            tab.set_default_timeout(timeout);
            tab.navigate_to(&url)?;
            if wait_until == WaitUntil::Navigated {
                tab.wait_until_navigated()?;
            }
            Ok(())
        })
        .await
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> anyhow::Result<()> {
        let selector = selector.to_string();
        self.with_tab(move |tab| {
            tab.wait_for_element_with_custom_timeout(&selector, timeout)?;
            Ok(())
        })
        .await
    }

    async fn content(&self) -> anyhow::Result<String> {
        self.with_tab(|tab| tab.get_content()).await
    }

    async fn evaluate(&self, script: &str) -> anyhow::Result<serde_json::Value> {
        let script = script.to_string();
        self.with_tab(move |tab| {
            let result = tab.evaluate(&script, false)?;
            Ok(result.value.unwrap_or(serde_json::Value::Null))
        })
        .await
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.with_tab(|tab| {
            tab.close(false)?;
            Ok(())
        })
        .await
    }
}
