//! Test configuration builders.

use crate::config::PsegConfig;

/// A portal config pointing at a test server, with short timeouts so
/// failure-path tests stay fast.
pub fn test_pseg_config(base_url: String) -> PsegConfig {
    PsegConfig {
        username: "test_user".to_string(),
        password: "test_password".to_string(),
        base_url,
        webdriver_url: None,
        http_timeout_sec: 5,
        login_wait_sec: 2,
    }
}
