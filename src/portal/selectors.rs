//! Page routes and element locators of the records portal.
//!
//! The portal is a single-page app; these are the only places its DOM is
//! named, so a portal redesign is fixed here.

use crate::webdriver::Locator;

pub const LOGIN_ROUTE: &str = "#/login";
pub const SEARCH_ROUTE: &str = "#/search/recordSearch";

pub fn email_input() -> Locator {
    Locator::name("email")
}

pub fn password_input() -> Locator {
    Locator::name("password")
}

pub fn terms_checkbox() -> Locator {
    Locator::name("termsCheck")
}

pub fn login_button() -> Locator {
    Locator::xpath("//button[text()='Login']")
}

/// A cell in the court or record-category table, matched on its text.
pub fn table_cell(text: &str) -> Locator {
    Locator::xpath(format!(
        "//td[normalize-space(text())={}]",
        xpath_literal(text)
    ))
}

pub fn name_input() -> Locator {
    Locator::id("search-name-input")
}

pub fn from_date_input() -> Locator {
    Locator::xpath("//div[@id='search-from-calendar']//input[@type='text']")
}

pub fn to_date_input() -> Locator {
    Locator::xpath("//div[@id='search-to-calendar']//input[@type='text']")
}

pub fn instrument_type_dropdown() -> Locator {
    Locator::xpath("//label[text()='Instrument Type']/following-sibling::div")
}

pub fn dropdown_input() -> Locator {
    Locator::tag("input")
}

pub fn search_button() -> Locator {
    Locator::xpath("//button[normalize-space(text())='Search']")
}

pub fn result_rows() -> Locator {
    Locator::css("#court_fips_table tbody tr")
}

pub fn viewer_tools_toggle() -> Locator {
    Locator::id("secondaryToolbarToggle")
}

pub fn viewer_download_button() -> Locator {
    Locator::id("secondaryDownload")
}

pub fn go_back_button() -> Locator {
    Locator::xpath("//button[contains(text(), 'Go Back')]")
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath has no escape syntax, so text containing both quote kinds is
/// assembled with `concat()`.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }

    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}
