use std::fmt;

/// The two utility service types tracked on a PSE&G account.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Commodity {
    Electricity,
    Gas,
}

impl Commodity {
    /// All commodities a cycle attempts, in a fixed order.
    pub const ALL: [Commodity; 2] = [Commodity::Electricity, Commodity::Gas];
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Commodity::Electricity => write!(f, "electricity"),
            Commodity::Gas => write!(f, "gas"),
        }
    }
}

/// Portal account credentials, owned by the authenticator for the duration
/// of a login attempt.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// The password must never reach a log line, including via {:?} on a
// containing struct.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// One retrieved portal page, passed by value to the extractor and then
/// discarded.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commodity_display() {
        assert_eq!(Commodity::Electricity.to_string(), "electricity");
        assert_eq!(Commodity::Gas.to_string(), "gas");
    }

    #[test]
    fn test_commodity_all_order() {
        assert_eq!(Commodity::ALL, [Commodity::Electricity, Commodity::Gas]);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("user@example.com", "hunter2");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("user@example.com"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
