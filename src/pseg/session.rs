use chrono::{DateTime, Local};

/// Cookies proving an authenticated state with the portal.
///
/// Valid for one fetch cycle only; the pipeline discards it at cycle end
/// and every poll may re-authenticate. Both login strategies produce the
/// same shape, so the rest of the pipeline cannot tell which path was used.
#[derive(Debug, Clone)]
pub struct Session {
    cookies: Vec<(String, String)>,
    pub established_at: DateTime<Local>,
}

impl Session {
    pub fn new(cookies: Vec<(String, String)>) -> Self {
        Self {
            cookies,
            established_at: Local::now(),
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|(n, _)| n == name)
    }

    /// Renders the `Cookie` request header value.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
