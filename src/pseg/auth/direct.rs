use crate::config::PsegConfig;
use crate::error::AuthError;
use crate::model::Credentials;
use crate::pseg::constants;
use crate::pseg::session::Session;
use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client as HttpClient, Response};
use scraper::{Html, Selector};
use std::time::Duration;

use super::LoginStrategy;

/// Form-encoded POST against the portal's login endpoint.
///
/// Much lighter than driving a browser, but the first thing the portal's
/// anti-automation defenses reject. Redirect following is disabled so the
/// post-login redirect can be inspected directly.
pub struct DirectLoginStrategy {
    http_client: HttpClient,
    config: PsegConfig,
}

impl DirectLoginStrategy {
    pub fn new(config: PsegConfig) -> Self {
        // Redirect inspection is load-bearing for login classification,
        // so a client without Policy::none() must never be substituted.
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.http_timeout_sec))
            .redirect(Policy::none())
            .build()
            .expect("Failed to build login HTTP client");
        Self {
            http_client,
            config,
        }
    }

    /// Loads the login form to pick up pre-login cookies and the hidden
    /// CSRF token, when the portal ships one.
    async fn load_login_form(&self) -> Result<(Vec<(String, String)>, Option<String>), AuthError> {
        let url = format!("{}{}", self.config.base_url, constants::LOGIN_PATH);
        let response = self
            .http_client
            .get(&url)
            .header("user-agent", "reqwest")
            .send()
            .await
            .map_err(|e| AuthError::challenge("direct", format!("login page unreachable: {}", e)))?;

        let cookies = harvest_cookies(&response);
        let body = response
            .text()
            .await
            .map_err(|e| AuthError::challenge("direct", format!("login page unreadable: {}", e)))?;

        let document = Html::parse_document(&body);
        let token = Selector::parse(constants::CSRF_SELECTOR)
            .ok()
            .and_then(|sel| {
                document
                    .select(&sel)
                    .next()
                    .and_then(|input| input.value().attr("value"))
                    .map(str::to_string)
            });

        Ok((cookies, token))
    }

    /// Classifies the POST response: session, credential rejection, or
    /// challenge.
    fn evaluate_login_response(
        &self,
        status: u16,
        location: Option<&str>,
        body: &str,
        cookies: Vec<(String, String)>,
    ) -> Result<Session, AuthError> {
        let lowered = body.to_lowercase();

        for marker in constants::INVALID_CREDENTIAL_MARKERS {
            if lowered.contains(marker) {
                return Err(AuthError::InvalidCredentials(
                    "portal reported a username/password mismatch".to_string(),
                ));
            }
        }

        for marker in constants::CHALLENGE_MARKERS {
            if lowered.contains(marker) {
                return Err(AuthError::challenge(
                    "direct",
                    format!("challenge marker '{}' present in response", marker),
                ));
            }
        }

        // A real login answers with a redirect away from the login form.
        let redirected_past_login = (300..400).contains(&status)
            && location.is_some_and(|loc| !loc.contains(constants::LOGIN_PATH));
        if !redirected_past_login {
            return Err(AuthError::challenge(
                "direct",
                format!("expected post-login redirect, got status {}", status),
            ));
        }

        let session = Session::new(cookies);
        if !session.has_cookie(constants::SESSION_COOKIE) {
            return Err(AuthError::challenge(
                "direct",
                format!("'{}' cookie not set after login", constants::SESSION_COOKIE),
            ));
        }

        Ok(session)
    }
}

#[async_trait]
impl LoginStrategy for DirectLoginStrategy {
    fn name(&self) -> &'static str {
        "direct"
    }

    async fn attempt_login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let (mut cookies, csrf_token) = self.load_login_form().await?;

        let mut form: Vec<(&str, &str)> = vec![
            (constants::USERNAME_FIELD, credentials.username.as_str()),
            (constants::PASSWORD_FIELD, credentials.password.as_str()),
        ];
        if let Some(token) = csrf_token.as_deref() {
            form.push((constants::CSRF_FIELD, token));
        }

        let url = format!("{}{}", self.config.base_url, constants::LOGIN_PATH);
        let pre_login_session = Session::new(cookies.clone());
        let response = self
            .http_client
            .post(&url)
            .header("user-agent", "reqwest")
            .header("cookie", pre_login_session.cookie_header())
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::challenge("direct", format!("login POST failed: {}", e)))?;

        let status = response.status().as_u16();
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        merge_cookies(&mut cookies, harvest_cookies(&response));
        let body = response.text().await.unwrap_or_default();

        self.evaluate_login_response(status, location.as_deref(), &body, cookies)
    }
}

/// Collects `Set-Cookie` name/value pairs from a response.
fn harvest_cookies(response: &Response) -> Vec<(String, String)> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .filter_map(parse_set_cookie)
        .collect()
}

/// Parses the `name=value` part of a `Set-Cookie` header, ignoring
/// attributes like `Path` and `HttpOnly`.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?;
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

/// Merges new cookies over existing ones, later values winning.
fn merge_cookies(existing: &mut Vec<(String, String)>, new: Vec<(String, String)>) {
    for (name, value) in new {
        if let Some(slot) = existing.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            existing.push((name, value));
        }
    }
}
