//! Lock vendor API integration for visit tracking.
//!
//! Retrieves the raw event log of one lock, page by page, by replaying an
//! events request captured from a logged-in browser session. The session
//! cookie itself comes from replaying the captured login requests.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Default request timeout for API calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Longest accepted base delay between requests.
pub const MAX_DELAY_SECS: u64 = 3600;

/// Headers the client sets itself or that must not be replayed.
const SKIPPED_HEADERS: [&str; 4] = ["cookie", "referer", "content-length", "host"];

/// Remote client errors.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The session cookie was missing or blank.
    #[error("invalid session cookie: {reason}")]
    InvalidCookie { reason: &'static str },
    /// The request template could not be used.
    #[error("invalid request template: {0}")]
    InvalidTemplate(String),
    /// The lock's events page URL did not have the expected shape.
    #[error("invalid events page URL {url}: expected https://<host>/devices/<type>/<id>/events")]
    InvalidDeviceUrl { url: String },
    /// The delay between requests was out of range.
    #[error("delay must be between 1 and 3600 seconds, got {0}")]
    InvalidDelay(u64),
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// API returned an error response.
    #[error("API error: status {status}: {body}")]
    Api { status: u16, body: String },
    /// Failed to parse response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// An events API request captured from the vendor's web app.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestTemplate {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON request body, as text.
    #[serde(default)]
    pub body: Option<String>,
}

impl RequestTemplate {
    /// Parses a template from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, RemoteError> {
        serde_json::from_str(json).map_err(|err| RemoteError::InvalidTemplate(err.to_string()))
    }

    fn http_method(&self) -> Result<reqwest::Method, RemoteError> {
        reqwest::Method::from_bytes(self.method.to_uppercase().as_bytes())
            .map_err(|err| RemoteError::InvalidTemplate(format!("method: {err}")))
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Starts a request with the template's URL and replayable headers.
    fn replay(
        &self,
        http: &reqwest::Client,
        method: reqwest::Method,
    ) -> reqwest::RequestBuilder {
        let mut request = http.request(method, &self.url);
        for (name, value) in &self.headers {
            let lower = name.to_ascii_lowercase();
            if lower.starts_with(':') || SKIPPED_HEADERS.contains(&lower.as_str()) {
                continue;
            }
            request = request.header(name, value);
        }
        request
    }

    /// Login request body with `{{email}}` and `{{password}}` filled in.
    ///
    /// Values are encoded to match the template's `Content-Type`. A body
    /// without placeholders is sent as captured.
    pub fn body_with_credentials(&self, credentials: &Credentials) -> String {
        let body = self.body.clone().unwrap_or_default();
        let content_type = self.header("content-type").unwrap_or_default();
        let encode = |value: &str| -> String {
            if content_type.contains("x-www-form-urlencoded") {
                url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
            } else if content_type.contains("json") {
                let quoted = Value::from(value).to_string();
                quoted[1..quoted.len() - 1].to_string()
            } else {
                value.to_string()
            }
        };
        body.replace("{{email}}", &encode(&credentials.email))
            .replace("{{password}}", &encode(&credentials.password))
    }

    /// Request body for one page: the template body with `page` and
    /// `publisher_id` set.
    pub fn body_for_page(&self, page: u32, publisher_id: &str) -> Result<String, RemoteError> {
        let mut body = match self.body.as_deref() {
            Some(text) if !text.trim().is_empty() => serde_json::from_str::<Value>(text)
                .map_err(|err| RemoteError::InvalidTemplate(format!("body: {err}")))?,
            _ => Value::Object(serde_json::Map::new()),
        };
        let Some(object) = body.as_object_mut() else {
            return Err(RemoteError::InvalidTemplate(
                "body must be a JSON object".to_string(),
            ));
        };
        object.insert("page".to_string(), Value::from(page));
        object.insert("publisher_id".to_string(), Value::from(publisher_id));
        Ok(body.to_string())
    }
}

/// The lock whose events are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockDevice {
    /// Scheme and host of the vendor web app, e.g. `https://connect.remotelock.com`.
    pub origin: String,
    pub device_type: String,
    pub publisher_id: String,
}

impl LockDevice {
    /// The events page a browser would be on when requesting `page`.
    pub fn referer(&self, page: u32) -> String {
        format!(
            "{}/devices/{}/{}/events?page={page}",
            self.origin, self.device_type, self.publisher_id
        )
    }
}

/// Extracts the device from the lock's events page URL.
pub fn parse_device_url(url: &str) -> Result<LockDevice, RemoteError> {
    let invalid = || RemoteError::InvalidDeviceUrl {
        url: url.to_string(),
    };
    let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;
    let mut segments = rest.split(['/', '?', '#']);
    let host = segments.next().filter(|h| !h.is_empty()).ok_or_else(invalid)?;
    if segments.next() != Some("devices") {
        return Err(invalid());
    }
    let device_type = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    let publisher_id = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;

    Ok(LockDevice {
        origin: format!("{scheme}://{host}"),
        device_type: device_type.to_string(),
        publisher_id: publisher_id.to_string(),
    })
}

/// Which pages to fetch and how fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
    /// First page, 1-based.
    pub start: u32,
    /// Number of pages.
    pub pages: u32,
    /// Base delay before each request; jittered by up to half a second.
    pub delay_secs: u64,
}

impl CollectOptions {
    /// Validates the options.
    pub fn validate(&self) -> Result<(), RemoteError> {
        if !(1..=MAX_DELAY_SECS).contains(&self.delay_secs) {
            return Err(RemoteError::InvalidDelay(self.delay_secs));
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn jittered_delay(&self) -> Result<Duration, RemoteError> {
        let jitter = rand::random::<f64>() - 0.5;
        Duration::try_from_secs_f64(self.delay_secs as f64 + jitter)
            .map_err(|_| RemoteError::InvalidDelay(self.delay_secs))
    }
}

/// One fetched page of events.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub number: u32,
    pub status: u16,
    pub events: Vec<Value>,
}

/// Lock vendor API client.
///
/// The client is cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    template: RequestTemplate,
    method: reqwest::Method,
    session_cookie: String,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("url", &self.template.url)
            .field("session_cookie", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client that replays `template` with the given session cookie.
    pub fn new(
        template: RequestTemplate,
        session_cookie: impl Into<String>,
    ) -> Result<Self, RemoteError> {
        let session_cookie = session_cookie.into();
        if session_cookie.trim().is_empty() {
            return Err(RemoteError::InvalidCookie {
                reason: "session cookie cannot be empty",
            });
        }

        let method = template.http_method()?;

        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(RemoteError::ClientBuild)?;

        Ok(Self {
            http,
            template,
            method,
            session_cookie,
        })
    }

    /// Fetches a single page of events for `device`.
    pub async fn fetch_page(&self, device: &LockDevice, page: u32) -> Result<Page, RemoteError> {
        let mut request = self
            .template
            .replay(&self.http, self.method.clone())
            .header("Cookie", &self.session_cookie)
            .header("Referer", device.referer(page));
        if self.method != reqwest::Method::GET {
            request = request.body(self.template.body_for_page(page, &device.publisher_id)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::info!(page, status = status.as_u16(), "fetched events page");
        tracing::debug!(page, body = %body, "response body");

        if status.is_client_error() || status.is_server_error() {
            return Err(RemoteError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Page {
            number: page,
            status: status.as_u16(),
            events: parse_events_payload(&body)?,
        })
    }

    /// Fetches every page in `options` in order, sleeping before each
    /// request.
    ///
    /// Each page is handed to `on_page` as soon as it arrives, so pages
    /// fetched before a failure are not lost. Returns the number of pages
    /// fetched.
    pub async fn collect<F>(
        &self,
        device: &LockDevice,
        options: CollectOptions,
        mut on_page: F,
    ) -> Result<u32, RemoteError>
    where
        F: FnMut(Page),
    {
        options.validate()?;
        let mut fetched = 0;
        for number in options.start..options.start.saturating_add(options.pages) {
            tokio::time::sleep(options.jittered_delay()?).await;
            let page = self.fetch_page(device, number).await?;
            on_page(page);
            fetched += 1;
        }
        Ok(fetched)
    }
}

/// Account credentials for the vendor web app.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Obtains a session cookie by replaying the captured login requests.
#[derive(Debug, Clone)]
pub struct Authenticator {
    http: reqwest::Client,
}

impl Authenticator {
    /// Creates an authenticator. Redirects are not followed, so the cookie
    /// set by a login redirect stays visible.
    pub fn new() -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(RemoteError::ClientBuild)?;
        Ok(Self { http })
    }

    /// Runs the pre-auth request to open a session, then the auth request
    /// with that session and the credentials.
    ///
    /// Returns the `name=value` part of the cookie the login response sets,
    /// or the pre-auth cookie when the login response sets none.
    pub async fn login(
        &self,
        preauth: &RequestTemplate,
        auth: &RequestTemplate,
        credentials: &Credentials,
    ) -> Result<String, RemoteError> {
        let response = preauth
            .replay(&self.http, preauth.http_method()?)
            .send()
            .await?;
        let session = checked(response, "pre-auth")
            .await?
            .ok_or_else(|| RemoteError::InvalidResponse("pre-auth response set no cookie".to_string()))?;
        tracing::debug!(email = %credentials.email, "pre-auth session opened");

        let method = auth.http_method()?;
        let mut request = auth.replay(&self.http, method.clone()).header("Cookie", &session);
        if method != reqwest::Method::GET {
            request = request.body(auth.body_with_credentials(credentials));
        }
        let renewed = checked(request.send().await?, "auth").await?;
        Ok(renewed.unwrap_or(session))
    }
}

/// Fails on error statuses and returns the session cookie the response sets.
async fn checked(
    response: reqwest::Response,
    step: &'static str,
) -> Result<Option<String>, RemoteError> {
    let status = response.status();
    tracing::info!(step, status = status.as_u16(), "login step finished");
    let cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(session_cookie_part)
        .filter(|cookie| !cookie.is_empty());

    if status.is_client_error() || status.is_server_error() {
        return Err(RemoteError::Api {
            status: status.as_u16(),
            body: response.text().await?,
        });
    }
    Ok(cookie)
}

/// The `name=value` part of a `Set-Cookie` header value.
fn session_cookie_part(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn parse_events_payload(body: &str) -> Result<Vec<Value>, RemoteError> {
    #[derive(Deserialize)]
    struct Payload {
        #[serde(default)]
        data: Vec<Value>,
    }

    serde_json::from_str::<Payload>(body)
        .map(|payload| payload.data)
        .map_err(|err| RemoteError::InvalidResponse(err.to_string()))
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    const DEVICE_URL: &str = "https://connect.remotelock.com/devices/lock/8f1c2d/events";

    fn template(url: &str) -> RequestTemplate {
        RequestTemplate {
            url: url.to_string(),
            method: "POST".to_string(),
            headers: BTreeMap::from([
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Length".to_string(), "999".to_string()),
                (":authority".to_string(), "connect.remotelock.com".to_string()),
            ]),
            body: Some(r#"{"page": 1, "per_page": 50}"#.to_string()),
        }
    }

    #[test]
    fn parses_device_url() {
        let device = parse_device_url(DEVICE_URL).unwrap();
        assert_eq!(device.origin, "https://connect.remotelock.com");
        assert_eq!(device.device_type, "lock");
        assert_eq!(device.publisher_id, "8f1c2d");
        assert_eq!(
            device.referer(3),
            "https://connect.remotelock.com/devices/lock/8f1c2d/events?page=3"
        );
    }

    #[test]
    fn rejects_url_without_device() {
        for url in [
            "https://connect.remotelock.com/locks/8f1c2d",
            "https://connect.remotelock.com/devices/lock",
            "connect.remotelock.com/devices/lock/8f1c2d",
        ] {
            assert!(
                matches!(parse_device_url(url), Err(RemoteError::InvalidDeviceUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn body_sets_page_and_publisher() {
        let body = template(DEVICE_URL).body_for_page(4, "8f1c2d").unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["page"], 4);
        assert_eq!(value["publisher_id"], "8f1c2d");
        assert_eq!(value["per_page"], 50);
    }

    #[test]
    fn body_must_be_an_object() {
        let template = RequestTemplate {
            body: Some("[1, 2]".to_string()),
            ..template(DEVICE_URL)
        };
        assert!(matches!(
            template.body_for_page(1, "x"),
            Err(RemoteError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn template_parses_captured_request() {
        let json = r#"{
            "url": "https://connect.remotelock.com/api/events",
            "method": "POST",
            "headers": {"Accept": "application/json"},
            "body": "{\"page\": 1}"
        }"#;
        let template = RequestTemplate::from_json(json).unwrap();
        assert_eq!(template.method, "POST");
        assert_eq!(template.headers["Accept"], "application/json");
    }

    #[test]
    fn client_rejects_blank_cookie() {
        assert!(matches!(
            Client::new(template(DEVICE_URL), "  "),
            Err(RemoteError::InvalidCookie { .. })
        ));
    }

    #[test]
    fn client_debug_redacts_cookie() {
        let client = Client::new(template(DEVICE_URL), "_session=secret").unwrap();
        let debug = format!("{client:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn zero_delay_is_rejected() {
        let options = CollectOptions {
            start: 1,
            pages: 1,
            delay_secs: 0,
        };
        assert!(matches!(options.validate(), Err(RemoteError::InvalidDelay(0))));
    }

    #[test]
    fn huge_delay_is_rejected_instead_of_overflowing() {
        let options = CollectOptions {
            start: 1,
            pages: 1,
            delay_secs: u64::MAX,
        };
        assert!(matches!(
            options.validate(),
            Err(RemoteError::InvalidDelay(u64::MAX))
        ));
        assert!(matches!(
            options.jittered_delay(),
            Err(RemoteError::InvalidDelay(u64::MAX))
        ));

        let options = CollectOptions {
            delay_secs: MAX_DELAY_SECS,
            ..options
        };
        assert!(options.validate().is_ok());
        assert!(options.jittered_delay().unwrap() >= Duration::from_secs(MAX_DELAY_SECS - 1));
    }

    #[test]
    fn payload_without_data_is_empty() {
        assert!(parse_events_payload("{}").unwrap().is_empty());
        assert!(matches!(
            parse_events_payload("<html>"),
            Err(RemoteError::InvalidResponse(_))
        ));
    }

    /// Serves one canned HTTP response and returns the raw request it got.
    async fn serve_once(
        status_line: &'static str,
        extra_headers: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/events", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + content_length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            let response = format!(
                "{status_line}\r\n{extra_headers}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn fetch_page_replays_template() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK",
            "",
            r#"{"data": [{"type": "locked_event"}, {"type": "unlocked_event"}]}"#,
        )
        .await;
        let client = Client::new(template(&url), "_session=abc").unwrap();
        let device = parse_device_url(DEVICE_URL).unwrap();

        let page = client.fetch_page(&device, 2).await.unwrap();
        let request = server.await.unwrap().to_ascii_lowercase();

        assert_eq!(page.number, 2);
        assert_eq!(page.status, 200);
        assert_eq!(page.events.len(), 2);
        assert!(request.starts_with("post /api/events"));
        assert!(request.contains("cookie: _session=abc"));
        assert!(request.contains("referer: https://connect.remotelock.com/devices/lock/8f1c2d/events?page=2"));
        assert!(request.contains("\"page\":2"));
        assert!(!request.contains(":authority"));
    }

    #[tokio::test]
    async fn collect_hands_each_page_to_callback() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK",
            "",
            r#"{"data": [{"type": "locked_event"}]}"#,
        )
        .await;
        let client = Client::new(template(&url), "_session=abc").unwrap();
        let device = parse_device_url(DEVICE_URL).unwrap();
        let options = CollectOptions {
            start: 7,
            pages: 1,
            delay_secs: 1,
        };

        let mut seen = Vec::new();
        let fetched = client
            .collect(&device, options, |page| seen.push((page.number, page.events.len())))
            .await
            .unwrap();
        server.await.unwrap();

        assert_eq!(fetched, 1);
        assert_eq!(seen, [(7, 1)]);
    }

    #[tokio::test]
    async fn fetch_page_reports_api_errors() {
        let (url, server) = serve_once("HTTP/1.1 401 Unauthorized", "", r#"{"error": "login"}"#).await;
        let client = Client::new(template(&url), "_session=expired").unwrap();
        let device = parse_device_url(DEVICE_URL).unwrap();

        let err = client.fetch_page(&device, 1).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, RemoteError::Api { status: 401, .. }));
    }

    fn login_template(url: &str, content_type: &str, body: &str) -> RequestTemplate {
        RequestTemplate {
            url: url.to_string(),
            method: "POST".to_string(),
            headers: BTreeMap::from([
                ("Content-Type".to_string(), content_type.to_string()),
                ("Cookie".to_string(), "_session=captured".to_string()),
            ]),
            body: Some(body.to_string()),
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            email: "ops@example.com".to_string(),
            password: "p&ss \"word\"".to_string(),
        }
    }

    #[test]
    fn credentials_are_encoded_for_the_body_type() {
        let form = login_template(
            "https://connect.remotelock.com/login",
            "application/x-www-form-urlencoded",
            "user%5Bemail%5D={{email}}&user%5Bpassword%5D={{password}}",
        );
        assert_eq!(
            form.body_with_credentials(&credentials()),
            "user%5Bemail%5D=ops%40example.com&user%5Bpassword%5D=p%26ss+%22word%22"
        );

        let json = login_template(
            "https://connect.remotelock.com/login",
            "application/json",
            r#"{"email": "{{email}}", "password": "{{password}}"}"#,
        );
        let body: Value = serde_json::from_str(&json.body_with_credentials(&credentials())).unwrap();
        assert_eq!(body["password"], "p&ss \"word\"");
    }

    #[test]
    fn set_cookie_keeps_name_value_only() {
        assert_eq!(
            session_cookie_part("_session=abc123; path=/; secure; HttpOnly"),
            "_session=abc123"
        );
        assert_eq!(session_cookie_part("_session=abc123"), "_session=abc123");
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let debug = format!("{:?}", credentials());
        assert!(debug.contains("ops@example.com"));
        assert!(!debug.contains("word"));
    }

    #[tokio::test]
    async fn login_replays_preauth_then_auth() {
        let (preauth_url, preauth_server) = serve_once(
            "HTTP/1.1 200 OK",
            "Set-Cookie: _session=pre; path=/; HttpOnly\r\n",
            "{}",
        )
        .await;
        let (auth_url, auth_server) = serve_once(
            "HTTP/1.1 302 Found",
            "Location: /dashboard\r\nSet-Cookie: _session=authed; path=/; secure\r\n",
            "",
        )
        .await;
        let preauth = RequestTemplate {
            method: "GET".to_string(),
            body: None,
            ..login_template(&preauth_url, "text/html", "")
        };
        let auth = login_template(
            &auth_url,
            "application/x-www-form-urlencoded",
            "email={{email}}&password={{password}}",
        );

        let cookie = Authenticator::new()
            .unwrap()
            .login(&preauth, &auth, &credentials())
            .await
            .unwrap();
        preauth_server.await.unwrap();
        let auth_request = auth_server.await.unwrap();

        assert_eq!(cookie, "_session=authed");
        assert!(auth_request.to_ascii_lowercase().contains("cookie: _session=pre"));
        assert!(!auth_request.contains("_session=captured"));
        assert!(auth_request.contains("email=ops%40example.com&password=p%26ss+%22word%22"));
    }

    #[tokio::test]
    async fn login_keeps_preauth_cookie_when_auth_sets_none() {
        let (preauth_url, preauth_server) =
            serve_once("HTTP/1.1 200 OK", "Set-Cookie: _session=pre; path=/\r\n", "{}").await;
        let (auth_url, auth_server) = serve_once("HTTP/1.1 200 OK", "", "{}").await;
        let preauth = login_template(&preauth_url, "application/json", "{}");
        let auth = login_template(&auth_url, "application/json", "{}");

        let cookie = Authenticator::new()
            .unwrap()
            .login(&preauth, &auth, &credentials())
            .await
            .unwrap();
        preauth_server.await.unwrap();
        auth_server.await.unwrap();

        assert_eq!(cookie, "_session=pre");
    }

    #[tokio::test]
    async fn login_fails_without_preauth_cookie() {
        let (preauth_url, preauth_server) = serve_once("HTTP/1.1 200 OK", "", "{}").await;
        let preauth = login_template(&preauth_url, "application/json", "{}");
        let auth = login_template("http://127.0.0.1:9/unused", "application/json", "{}");

        let err = Authenticator::new()
            .unwrap()
            .login(&preauth, &auth, &credentials())
            .await
            .unwrap_err();
        preauth_server.await.unwrap();

        assert!(matches!(err, RemoteError::InvalidResponse(_)));
    }
}
