//! Records portal abstraction.
//!
//! The harvest loop only needs a handful of portal operations; putting them
//! behind [`RecordPortal`] keeps the loop independent of the browser and
//! lets it run against an in-memory portal in tests.

pub mod selectors;
mod session;

pub use session::{Pauses, PortalConfig, PortalSession};

use crate::config::SearchProfile;
use crate::error::PortalResult;
use crate::types::SearchWindow;
use async_trait::async_trait;
use std::fmt;

/// Portal login credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Operations the harvest loop performs against a records portal.
///
/// Row indices refer to the current result list, which the portal
/// re-renders after every [`go_back`](RecordPortal::go_back).
#[async_trait]
pub trait RecordPortal: Send {
    /// Sign in. Failure ends the session.
    async fn login(&mut self) -> PortalResult<()>;

    /// Fill and submit the search form.
    async fn search(&mut self, profile: &SearchProfile, window: SearchWindow) -> PortalResult<()>;

    /// Number of rows in the current result list.
    async fn row_count(&mut self) -> PortalResult<usize>;

    /// Open row `index` in the document viewer and trigger its PDF download.
    async fn download_row(&mut self, index: usize) -> PortalResult<()>;

    /// Return from the document viewer to the result list.
    async fn go_back(&mut self) -> PortalResult<()>;

    /// Release the browser. Safe to call more than once.
    async fn close(&mut self) -> PortalResult<()>;
}
