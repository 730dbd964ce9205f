//! Vendor-specific portal constants.
//!
//! The PSE&G portal publishes no API contract: every path, form field name,
//! cookie name, marker string, and CSS selector below was discovered by
//! inspecting the live site and will drift when the vendor redesigns it.
//! Keeping them all here means a markup change touches one file.

/// Login form page (GET for the pre-login cookies and CSRF token, POST for
/// credential submission).
pub const LOGIN_PATH: &str = "/user/login";

/// Best-effort session teardown at the end of a cycle.
pub const LOGOUT_PATH: &str = "/user/logout";

/// Per-commodity usage dashboard pages.
pub fn usage_page_path(commodity: crate::model::Commodity) -> &'static str {
    match commodity {
        crate::model::Commodity::Electricity => "/dashboard/energy?service=electric",
        crate::model::Commodity::Gas => "/dashboard/energy?service=gas",
    }
}

/// Login form field names (the ids double as the WebDriver locators).
pub const USERNAME_FIELD: &str = "username";
pub const PASSWORD_FIELD: &str = "password";
pub const SUBMIT_BUTTON: &str = "submit";

/// Hidden anti-forgery token input on the login form, when present.
pub const CSRF_FIELD: &str = "csrf_token";
pub const CSRF_SELECTOR: &str = r#"input[name="csrf_token"]"#;

/// Cookie the portal sets once a login is accepted. Its absence after a
/// form POST means the login did not actually take.
pub const SESSION_COOKIE: &str = "PSEG_SESSION";

/// Element that only renders on the authenticated dashboard; the browser
/// strategy waits for it before harvesting cookies.
pub const POST_LOGIN_MARKER: &str = "p.next-meter-reading";

/// Body substrings that indicate a bot/anti-automation challenge rather
/// than a credential problem. Matched in order by substring, so the more
/// specific markers come first ("captcha" would shadow "px-captcha").
pub const CHALLENGE_MARKERS: &[&str] = &["px-captcha", "challenge-form", "captcha"];

/// Body substrings for an explicit credential rejection.
pub const INVALID_CREDENTIAL_MARKERS: &[&str] = &[
    "invalid username or password",
    "the information you entered does not match our records",
];

/// Figure region candidates per commodity, tried in order.
pub const ELECTRIC_REGION_SELECTORS: &[&str] = &["#electric-usage", "div.usage-box.electric"];
pub const GAS_REGION_SELECTORS: &[&str] = &["#gas-usage", "div.usage-box.gas"];

/// Value nodes inside a figure region.
pub const USAGE_VALUE_SELECTOR: &str = "span.usage-value";
pub const USAGE_UNIT_SELECTOR: &str = "span.usage-unit";
pub const COST_VALUE_SELECTOR: &str = "span.cost-value";
pub const READ_DATE_SELECTOR: &str = "p.next-meter-reading";

/// Label words used by the label-adjacency locator. Matching is on lowered
/// text, label words paired with the commodity word.
pub const USAGE_LABELS: &[&str] = &["usage", "used"];
pub const COST_LABELS: &[&str] = &["cost", "bill"];
pub fn commodity_label(commodity: crate::model::Commodity) -> &'static str {
    match commodity {
        crate::model::Commodity::Electricity => "electric",
        crate::model::Commodity::Gas => "gas",
    }
}

/// Keys for the script-embedded JSON blob some portal builds ship.
pub struct JsonKeys {
    pub usage: &'static str,
    pub cost: &'static str,
    pub unit: &'static str,
}

pub fn json_keys(commodity: crate::model::Commodity) -> JsonKeys {
    match commodity {
        crate::model::Commodity::Electricity => JsonKeys {
            usage: "electricUsage",
            cost: "electricCost",
            unit: "electricUnit",
        },
        crate::model::Commodity::Gas => JsonKeys {
            usage: "gasUsage",
            cost: "gasCost",
            unit: "gasUnit",
        },
    }
}

/// Marker identifying the usage JSON among the page's script tags.
pub const JSON_SCRIPT_MARKER: &str = "__USAGE__";

/// Headless Chrome arguments for the browser login strategy.
pub const CHROME_ARGS: &[&str] = &["--headless=new", "--no-sandbox", "--disable-gpu"];
