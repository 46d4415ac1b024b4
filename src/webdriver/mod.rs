//! Minimal W3C WebDriver client.
//!
//! Only what the portal automation needs: one session, element lookup by
//! locator, clicks, typing, script execution, and fixed-interval waits.

mod client;
mod locator;
mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{BrowserOptions, ElementRef, WebDriverClient, ELEMENT_KEY};
pub use locator::Locator;
pub use wait::Wait;

/// Special keys from the WebDriver key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
}

impl Key {
    /// The private-use code point the server translates into a key press.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enter => "\u{E007}",
        }
    }
}
