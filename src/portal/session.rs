//! Live records-portal automation over a WebDriver session.

use super::selectors;
use super::{Credentials, RecordPortal};
use crate::config::SearchProfile;
use crate::error::{PortalError, PortalResult, WebDriverError};
use crate::types::SearchWindow;
use crate::webdriver::{ElementRef, Key, Locator, Wait, WebDriverClient};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

/// Settle pauses between UI actions.
///
/// The portal animates panels and debounces inputs; acting before it settles
/// clicks stale elements or drops keystrokes.
#[derive(Debug, Clone, Copy)]
pub struct Pauses {
    /// After typing or clicking into a form control.
    pub input: Duration,
    /// After clicking a result row, and after returning to the list.
    pub navigation: Duration,
    /// Before opening the viewer's secondary toolbar.
    pub viewer: Duration,
    /// After submitting the search.
    pub results: Duration,
}

impl Default for Pauses {
    fn default() -> Self {
        Self {
            input: Duration::from_millis(500),
            navigation: Duration::from_secs(1),
            viewer: Duration::from_secs(2),
            results: Duration::from_secs(3),
        }
    }
}

/// Connection settings for [`PortalSession`].
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Portal root, e.g. `https://risweb.vacourts.gov/jsra/sra`.
    pub base_url: String,
    pub credentials: Credentials,
    pub wait: Wait,
    pub pauses: Pauses,
}

impl PortalConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            wait: Wait::default(),
            pauses: Pauses::default(),
        }
    }

    pub fn with_wait(mut self, wait: Wait) -> Self {
        self.wait = wait;
        self
    }

    /// Absolute URL of a hash route.
    pub fn route(&self, route: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), route)
    }
}

/// The records portal driven through a browser.
pub struct PortalSession {
    driver: Option<WebDriverClient>,
    config: PortalConfig,
    /// The current search has shown its result list at least once.
    rows_listed: bool,
}

impl PortalSession {
    pub fn new(driver: WebDriverClient, config: PortalConfig) -> Self {
        Self {
            driver: Some(driver),
            config,
            rows_listed: false,
        }
    }

    fn driver(&self) -> Result<&WebDriverClient, WebDriverError> {
        self.driver
            .as_ref()
            .ok_or_else(|| WebDriverError::Protocol("browser session already closed".into()))
    }

    async fn try_login(&self) -> Result<(), WebDriverError> {
        let driver = self.driver()?;
        let wait = &self.config.wait;
        let creds = &self.config.credentials;

        driver.goto(&self.config.route(selectors::LOGIN_ROUTE)).await?;

        let email = driver.wait_present(wait, &selectors::email_input()).await?;
        driver.send_keys(&email, &creds.email).await?;

        let password = driver.wait_present(wait, &selectors::password_input()).await?;
        driver.send_keys(&password, &creds.password).await?;

        let terms = driver.find(&selectors::terms_checkbox()).await?;
        if !driver.is_selected(&terms).await? {
            driver.click(&terms).await?;
        }

        let login = driver.wait_clickable(wait, &selectors::login_button()).await?;
        driver.click(&login).await?;

        Ok(())
    }

    async fn click_when_ready(&self, locator: &Locator) -> Result<ElementRef, WebDriverError> {
        let driver = self.driver()?;
        let element = driver.wait_clickable(&self.config.wait, locator).await?;
        driver.click(&element).await?;
        Ok(element)
    }

    /// Clear, focus and type into a calendar input.
    async fn fill_date(&self, locator: &Locator, date: &str) -> Result<(), WebDriverError> {
        let driver = self.driver()?;
        let pause = self.config.pauses.input;

        let input = driver.wait_present(&self.config.wait, locator).await?;
        driver.clear(&input).await?;
        sleep(pause).await;
        driver.click(&input).await?;
        sleep(pause).await;
        driver.send_keys(&input, date).await
    }

    async fn select_instrument_types(&self, types: &[String]) -> Result<(), WebDriverError> {
        let driver = self.driver()?;

        let dropdown = driver
            .wait_present(&self.config.wait, &selectors::instrument_type_dropdown())
            .await?;
        driver.click(&dropdown).await?;

        let input = driver.find_in(&dropdown, &selectors::dropdown_input()).await?;
        for item in types.iter().filter(|t| !t.trim().is_empty()) {
            driver.clear(&input).await?;
            driver.send_keys(&input, item).await?;
            sleep(self.config.pauses.input).await;
            driver.send_keys(&input, Key::Enter.as_str()).await?;
            tracing::debug!(instrument = %item, "instrument type selected");
        }

        Ok(())
    }
}

/// Tag a search-form failure with the step it happened in.
fn step(step: &'static str) -> impl FnOnce(WebDriverError) -> PortalError {
    move |source| PortalError::Search { step, source }
}

#[async_trait]
impl RecordPortal for PortalSession {
    async fn login(&mut self) -> PortalResult<()> {
        self.try_login().await.map_err(PortalError::Login)?;
        tracing::info!(email = %self.config.credentials.email, "logged in");
        Ok(())
    }

    async fn search(&mut self, profile: &SearchProfile, window: SearchWindow) -> PortalResult<()> {
        self.rows_listed = false;
        let driver = self.driver()?;
        let pauses = self.config.pauses;

        driver
            .goto(&self.config.route(selectors::SEARCH_ROUTE))
            .await
            .map_err(step("open search page"))?;

        self.click_when_ready(&selectors::table_cell(&profile.locality))
            .await
            .map_err(step("select court"))?;
        self.click_when_ready(&selectors::table_cell(&profile.record_category))
            .await
            .map_err(step("select record category"))?;

        let name = driver
            .wait_present(&self.config.wait, &selectors::name_input())
            .await
            .map_err(step("name input"))?;
        driver
            .send_keys(&name, &profile.name_query)
            .await
            .map_err(step("name input"))?;

        self.fill_date(&selectors::from_date_input(), &window.from_str_portal())
            .await
            .map_err(step("from date"))?;
        self.fill_date(&selectors::to_date_input(), &window.to_str_portal())
            .await
            .map_err(step("to date"))?;

        self.select_instrument_types(&profile.instrument_types)
            .await
            .map_err(step("instrument types"))?;
        sleep(pauses.navigation).await;

        self.click_when_ready(&selectors::search_button())
            .await
            .map_err(step("submit"))?;
        sleep(pauses.results).await;

        tracing::info!(
            locality = %profile.locality,
            window = %window,
            instruments = profile.instrument_types.len(),
            "search submitted"
        );
        Ok(())
    }

    async fn row_count(&mut self) -> PortalResult<usize> {
        let rows = self
            .driver()?
            .wait_all_present(&self.config.wait, &selectors::result_rows())
            .await;
        match rows {
            Ok(rows) => {
                self.rows_listed = true;
                Ok(rows.len())
            }
            // A search with no matches never renders a row.
            Err(WebDriverError::Timeout(..)) if !self.rows_listed => {
                tracing::info!("search returned no results");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn download_row(&mut self, index: usize) -> PortalResult<()> {
        let driver = self.driver()?;
        let wait = &self.config.wait;
        let pauses = self.config.pauses;

        let rows = driver.wait_all_present(wait, &selectors::result_rows()).await?;
        let row = rows.get(index).ok_or(PortalError::RowOutOfRange(index))?;

        driver.scroll_to_top().await?;
        driver.click(row).await?;
        sleep(pauses.navigation).await;

        let tools = driver
            .wait_clickable(wait, &selectors::viewer_tools_toggle())
            .await?;
        sleep(pauses.viewer).await;
        driver.click(&tools).await?;
        sleep(pauses.navigation).await;

        let download = driver
            .wait_clickable(wait, &selectors::viewer_download_button())
            .await?;
        driver.js_click(&download).await?;

        Ok(())
    }

    async fn go_back(&mut self) -> PortalResult<()> {
        self.click_when_ready(&selectors::go_back_button()).await?;
        sleep(self.config.pauses.navigation).await;
        Ok(())
    }

    async fn close(&mut self) -> PortalResult<()> {
        match self.driver.take() {
            Some(driver) => Ok(driver.quit().await?),
            None => Ok(()),
        }
    }
}
