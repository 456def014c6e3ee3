use anyhow::{Context, Result};
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::protocol::cdp::Network::CookieParam;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ScrapeConfig;
use crate::loader::Scroll;

/// Site-wide cookie that pins the listing page's language.
pub(crate) fn locale_cookie(config: &ScrapeConfig) -> CookieParam {
    CookieParam {
        name: config.locale_cookie_name.clone(),
        value: config.locale_cookie_value.clone(),
        url: None,
        domain: Some(config.locale_cookie_domain.clone()),
        path: Some("/".to_string()),
        secure: None,
        http_only: None,
        same_site: None,
        expires: None,
        priority: None,
        same_party: None,
        source_scheme: None,
        source_port: None,
        partition_key: None,
    }
}

/// One Chrome window pointed at the listing page.
pub struct BrowserSession {
    // Dropping the browser kills Chrome, so it must outlive the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launch Chrome and prepare a tab with the locale cookie and
    /// `Accept-Language` header already in place.
    pub fn launch(config: &ScrapeConfig) -> Result<Self> {
        let lang_arg = format!("--lang={}", config.accept_language.split(',').next().unwrap_or("es-ES"));
        let args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--window-position=0,0"),
            OsStr::new(&lang_arg),
        ];

        info!("Launching browser (headless={})...", config.headless);
        let browser = Browser::new(LaunchOptions {
            headless: config.headless,
            window_size: Some((1920, 1080)),
            args,
            // Must outlast the quiet stretch of scrolling plus extraction.
            idle_browser_timeout: config.nav_timeout() + Duration::from_secs(600),
            ..Default::default()
        })
        .context("Failed to launch browser")?;

        let tab = browser.new_tab().context("Failed to open tab")?;
        tab.set_default_timeout(config.nav_timeout());

        tab.set_cookies(vec![locale_cookie(config)])
            .context("Failed to set locale cookie")?;

        let mut headers = HashMap::new();
        headers.insert("Accept-Language", config.accept_language.as_str());
        tab.set_extra_http_headers(headers)
            .context("Failed to set Accept-Language header")?;

        Ok(Self { _browser: browser, tab })
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        info!("Navigating to: {}", url);
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .with_context(|| format!("Navigation to {} failed", url))?;
        Ok(())
    }

    /// Best-effort PNG of the current viewport. Failures are only logged.
    pub fn screenshot(&self, path: &Path) {
        match self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        {
            Ok(png) => match std::fs::write(path, &png) {
                Ok(()) => info!("Screenshot saved to {}", path.display()),
                Err(e) => warn!("⚠️ Could not write screenshot {}: {}", path.display(), e),
            },
            Err(e) => warn!("⚠️ Screenshot failed: {}", e),
        }
    }

    /// Best-effort dump of the rendered document, reusable with `--snapshot`.
    pub fn dump_html(&self, path: &Path) {
        match self.tab.get_content() {
            Ok(html) => match std::fs::write(path, &html) {
                Ok(()) => info!("HTML ({} bytes) saved to {}", html.len(), path.display()),
                Err(e) => warn!("⚠️ Could not write {}: {}", path.display(), e),
            },
            Err(e) => warn!("⚠️ Could not read page content: {}", e),
        }
    }

    /// All cards currently attached to the document. None found is not an error.
    pub fn cards(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        match self.tab.find_elements(selector) {
            Ok(cards) => Ok(cards),
            Err(e) if e.downcast_ref::<NoElementFound>().is_some() => Ok(Vec::new()),
            Err(e) => Err(e).context("Card lookup failed"),
        }
    }
}

impl Scroll for BrowserSession {
    fn scroll_by(&self, delta_y: i64) -> Result<()> {
        self.tab
            .evaluate(&format!("window.scrollBy(0, {});", delta_y), false)
            .context("Scroll failed")?;
        Ok(())
    }
}
