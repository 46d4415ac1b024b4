//! W3C WebDriver client over HTTP.
//!
//! Implements the handful of commands the portal automation needs against a
//! chromedriver-compatible server: session lifecycle, navigation, element
//! lookup and interaction, and synchronous script execution.

use super::locator::Locator;
use super::wait::Wait;
use crate::error::{WebDriverError, WebDriverResult};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::Duration;

/// Key under which W3C servers return web element references.
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4ab8-66b8d41";

/// Key used by pre-W3C servers.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// HTTP timeout for a single WebDriver command.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Opaque reference to an element in the current browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    /// JSON form used when passing the element as a script argument.
    pub fn to_json(&self) -> Value {
        json!({ ELEMENT_KEY: self.0 })
    }
}

/// Browser launch options sent as session capabilities.
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Where the browser saves downloads.
    pub download_dir: PathBuf,
    /// Extra command-line switches for the browser.
    pub extra_args: Vec<String>,
}

impl BrowserOptions {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            headless: true,
            download_dir: download_dir.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The `alwaysMatch` capabilities for a Chrome session.
    ///
    /// PDFs must be downloaded instead of opened in the built-in viewer, and
    /// downloads must land in `download_dir` without a prompt.
    pub fn capabilities(&self) -> Value {
        let mut args: Vec<String> = Vec::new();
        if self.headless {
            args.push("--headless=new".to_string());
        }
        args.extend(self.extra_args.iter().cloned());

        json!({
            "browserName": "chrome",
            "goog:chromeOptions": {
                "args": args,
                "prefs": {
                    "download.default_directory": self.download_dir.to_string_lossy(),
                    "download.prompt_for_download": false,
                    "plugins.always_open_pdf_externally": true,
                }
            }
        })
    }
}

/// A live WebDriver session.
pub struct WebDriverClient {
    http: reqwest::Client,
    server: String,
    session_id: String,
}

impl WebDriverClient {
    /// Start a new browser session on the given WebDriver server.
    pub async fn connect(server_url: &str, options: &BrowserOptions) -> WebDriverResult<Self> {
        let http = reqwest::Client::builder().timeout(COMMAND_TIMEOUT).build()?;
        let server = server_url.trim_end_matches('/').to_string();

        let body = json!({ "capabilities": { "alwaysMatch": options.capabilities() } });
        let response = http
            .post(format!("{}/session", server))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        let value = unwrap_value(status.is_success(), payload)?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WebDriverError::Protocol("new session response has no sessionId".into())
            })?
            .to_string();

        tracing::info!(
            session = %session_id,
            headless = options.headless,
            "browser session started"
        );

        Ok(Self {
            http,
            server,
            session_id,
        })
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> WebDriverResult<Value> {
        let url = format!("{}/session/{}{}", self.server, self.session_id, path);
        tracing::debug!(%method, %path, "webdriver command");

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        unwrap_value(status.is_success(), payload)
    }

    async fn post(&self, path: &str, body: Value) -> WebDriverResult<Value> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn get(&self, path: &str) -> WebDriverResult<Value> {
        self.command(Method::GET, path, None).await
    }

    async fn get_bool(&self, path: &str) -> WebDriverResult<bool> {
        self.get(path)
            .await?
            .as_bool()
            .ok_or_else(|| WebDriverError::Protocol(format!("expected boolean from {}", path)))
    }

    /// Navigate the current tab.
    pub async fn goto(&self, url: &str) -> WebDriverResult<()> {
        self.post("/url", json!({ "url": url })).await.map(drop)
    }

    /// Find the first element matching `locator`.
    pub async fn find(&self, locator: &Locator) -> WebDriverResult<ElementRef> {
        let value = self.post("/element", locator.to_body()).await?;
        element_from(&value)
    }

    /// Find all elements matching `locator` (possibly none).
    pub async fn find_all(&self, locator: &Locator) -> WebDriverResult<Vec<ElementRef>> {
        let value = self.post("/elements", locator.to_body()).await?;
        elements_from(&value)
    }

    /// Find the first descendant of `parent` matching `locator`.
    pub async fn find_in(
        &self,
        parent: &ElementRef,
        locator: &Locator,
    ) -> WebDriverResult<ElementRef> {
        let path = format!("/element/{}/element", parent.id());
        let value = self.post(&path, locator.to_body()).await?;
        element_from(&value)
    }

    pub async fn click(&self, element: &ElementRef) -> WebDriverResult<()> {
        let path = format!("/element/{}/click", element.id());
        self.post(&path, json!({})).await.map(drop)
    }

    pub async fn clear(&self, element: &ElementRef) -> WebDriverResult<()> {
        let path = format!("/element/{}/clear", element.id());
        self.post(&path, json!({})).await.map(drop)
    }

    /// Type text into an element. Special keys come from [`super::Key`].
    pub async fn send_keys(&self, element: &ElementRef, text: &str) -> WebDriverResult<()> {
        let path = format!("/element/{}/value", element.id());
        self.post(&path, json!({ "text": text })).await.map(drop)
    }

    pub async fn is_selected(&self, element: &ElementRef) -> WebDriverResult<bool> {
        self.get_bool(&format!("/element/{}/selected", element.id())).await
    }

    pub async fn is_displayed(&self, element: &ElementRef) -> WebDriverResult<bool> {
        self.get_bool(&format!("/element/{}/displayed", element.id())).await
    }

    pub async fn is_enabled(&self, element: &ElementRef) -> WebDriverResult<bool> {
        self.get_bool(&format!("/element/{}/enabled", element.id())).await
    }

    /// Run a synchronous script in the page and return its result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> WebDriverResult<Value> {
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    /// Click through JavaScript, bypassing overlay and visibility checks.
    pub async fn js_click(&self, element: &ElementRef) -> WebDriverResult<()> {
        self.execute("arguments[0].click();", vec![element.to_json()])
            .await
            .map(drop)
    }

    pub async fn scroll_to_top(&self) -> WebDriverResult<()> {
        self.execute("window.scrollTo(0, 0);", Vec::new())
            .await
            .map(drop)
    }

    /// Wait until an element matching `locator` is present in the DOM.
    pub async fn wait_present(
        &self,
        wait: &Wait,
        locator: &Locator,
    ) -> WebDriverResult<ElementRef> {
        let what = format!("presence of {}", locator);
        wait.until(&what, || async move { self.find(locator).await.map(Some) })
            .await
    }

    /// Wait until at least one element matching `locator` is present.
    pub async fn wait_all_present(
        &self,
        wait: &Wait,
        locator: &Locator,
    ) -> WebDriverResult<Vec<ElementRef>> {
        let what = format!("presence of all {}", locator);
        wait.until(&what, || async move {
            let found = self.find_all(locator).await?;
            Ok((!found.is_empty()).then_some(found))
        })
        .await
    }

    /// Wait until an element is present, displayed and enabled.
    pub async fn wait_clickable(
        &self,
        wait: &Wait,
        locator: &Locator,
    ) -> WebDriverResult<ElementRef> {
        let what = format!("{} to be clickable", locator);
        wait.until(&what, || async move {
            let element = self.find(locator).await?;
            if self.is_displayed(&element).await? && self.is_enabled(&element).await? {
                Ok(Some(element))
            } else {
                Ok(None)
            }
        })
        .await
    }

    /// End the session and close the browser.
    pub async fn quit(self) -> WebDriverResult<()> {
        let url = format!("{}/session/{}", self.server, self.session_id);
        let response = self.http.delete(&url).send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;
        unwrap_value(status.is_success(), payload)?;
        tracing::info!(session = %self.session_id, "browser session closed");
        Ok(())
    }
}

/// Extract `value` from a WebDriver response, mapping error payloads.
pub(crate) fn unwrap_value(success: bool, mut payload: Value) -> WebDriverResult<Value> {
    let value = payload
        .get_mut("value")
        .map(Value::take)
        .unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(WebDriverError::Command {
            error: error.to_string(),
            message,
        });
    }

    if !success {
        return Err(WebDriverError::Protocol(format!(
            "error status without error payload: {}",
            value
        )));
    }

    Ok(value)
}

pub(crate) fn element_from(value: &Value) -> WebDriverResult<ElementRef> {
    let object = value
        .as_object()
        .ok_or_else(|| WebDriverError::Protocol(format!("expected element, got {}", value)))?;

    element_id(object)
        .map(ElementRef::new)
        .ok_or_else(|| WebDriverError::Protocol(format!("no element reference in {}", value)))
}

pub(crate) fn elements_from(value: &Value) -> WebDriverResult<Vec<ElementRef>> {
    value
        .as_array()
        .ok_or_else(|| WebDriverError::Protocol(format!("expected element list, got {}", value)))?
        .iter()
        .map(element_from)
        .collect()
}

fn element_id(object: &Map<String, Value>) -> Option<String> {
    object
        .get(ELEMENT_KEY)
        .or_else(|| object.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(str::to_string)
}
