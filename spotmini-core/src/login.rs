//! Interactive authorization-code login.
//!
//! # Flow Overview
//!
//! 1. Build the authorization URL (response type `code`, fixed loopback redirect)
//! 2. Bind the callback listener, then point the default browser at the URL
//! 3. User authorizes in browser
//! 4. Capture `GET /callback?code=...` and answer with a static page
//! 5. Hand the code back to the caller for the token exchange
//!
//! [`AuthorizationCodeSource`] is the seam the credential manager uses, so
//! tests can substitute a source that returns a fixed code.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use url::Url;

use crate::error::AuthError;
use crate::provider::ProviderConfig;

const SUCCESS_PAGE: &str = "<html><body><h1>Login Success!</h1>\
    <p>You can close this window and return to your terminal.</p></body></html>";

/// How long an accepted connection may stay silent before it is dropped.
const CALLBACK_READ_TIMEOUT: Duration = Duration::from_secs(10);

const DENIED_PAGE: &str = "<html><body><h1>Authentication Failed</h1>\
    <p>The provider returned an error.</p></body></html>";

/// Something that can produce an authorization code.
#[async_trait]
pub trait AuthorizationCodeSource: Send + Sync {
    /// Block until an authorization code is available.
    async fn obtain_code(&self) -> Result<String, AuthError>;
}

/// Result of inspecting one request on the callback listener.
#[derive(Debug, PartialEq, Eq)]
enum CallbackRequest {
    Code(String),
    Denied(String),
    MissingCode,
    OtherPath,
    Malformed,
}

/// Browser-based authorization-code login.
pub struct LoginFlow {
    provider: ProviderConfig,
    client_id: String,
    open_browser: bool,
    timeout: Option<Duration>,
}

impl LoginFlow {
    /// Create a login flow for `client_id` against `provider`.
    ///
    /// The browser is opened and the wait for the callback is unbounded
    /// until configured otherwise.
    pub fn new(provider: ProviderConfig, client_id: impl Into<String>) -> Self {
        Self {
            provider,
            client_id: client_id.into(),
            open_browser: true,
            timeout: None,
        }
    }

    /// Whether to launch the default URL handler.
    pub fn with_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Bound the wait for the callback. `None` waits until the process is killed.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the consent page URL.
    pub fn authorization_url(&self) -> Result<Url, AuthError> {
        let scope = self.provider.scopes.join(" ");
        let redirect_uri = self.provider.redirect_uri();

        Url::parse_with_params(
            &self.provider.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", redirect_uri.as_str()),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| AuthError::Login {
            message: format!("invalid auth URL: {}", e),
        })
    }

    /// Bind the loopback listener on the configured callback port.
    pub async fn bind(&self) -> Result<TcpListener, AuthError> {
        let addr = format!("127.0.0.1:{}", self.provider.callback_port);
        TcpListener::bind(&addr).await.map_err(|e| AuthError::Login {
            message: format!("failed to bind to {}: {}", addr, e),
        })
    }

    /// Serve `listener` until a request to `/callback` carries a code.
    ///
    /// Each connection is handled on its own task, so a browser's idle
    /// preconnect cannot hold up the real callback. Requests for other paths
    /// are answered with 404 and ignored.
    pub async fn listen_for_callback(&self, listener: TcpListener) -> Result<String, AuthError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("Listening for OAuth callback on {}", addr);
        }

        let (tx, mut rx) = mpsc::channel::<Result<String, AuthError>>(1);

        loop {
            tokio::select! {
                Some(outcome) = rx.recv() => return outcome,
                accepted = listener.accept() => {
                    let (socket, _) = accepted.map_err(|e| AuthError::Login {
                        message: format!("failed to accept connection: {}", e),
                    })?;

                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if let Some(outcome) = serve_callback(socket).await {
                            let _ = tx.send(outcome).await;
                        }
                    });
                }
            }
        }
    }
}

/// Answer one connection; `Some` when it ends the login.
async fn serve_callback(mut socket: TcpStream) -> Option<Result<String, AuthError>> {
    let mut buffer = [0; 4096];
    let n = match tokio::time::timeout(CALLBACK_READ_TIMEOUT, socket.read(&mut buffer)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => {
            tracing::debug!("Failed to read callback request: {}", e);
            return None;
        }
        Err(_) => {
            tracing::debug!("Dropping idle callback connection");
            return None;
        }
    };

    let request = String::from_utf8_lossy(&buffer[..n]);
    match parse_callback_request(&request) {
        CallbackRequest::Code(code) => {
            respond(&mut socket, "200 OK", SUCCESS_PAGE).await;
            Some(Ok(code))
        }
        CallbackRequest::Denied(reason) => {
            respond(&mut socket, "200 OK", DENIED_PAGE).await;
            Some(Err(AuthError::Login {
                message: format!("provider returned error: {}", reason),
            }))
        }
        CallbackRequest::OtherPath => {
            respond(&mut socket, "404 Not Found", "<html><body><h1>Not Found</h1></body></html>").await;
            None
        }
        CallbackRequest::MissingCode | CallbackRequest::Malformed => {
            respond(&mut socket, "400 Bad Request", "<html><body><h1>Bad Request</h1></body></html>").await;
            None
        }
    }
}

#[async_trait]
impl AuthorizationCodeSource for LoginFlow {
    async fn obtain_code(&self) -> Result<String, AuthError> {
        let auth_url = self.authorization_url()?;

        // Bind before sending the user off so a fast redirect cannot miss us.
        let listener = self.bind().await?;

        eprintln!("Login required. Opening browser: {}", auth_url);
        if self.open_browser {
            if let Err(e) = open::that_detached(auth_url.as_str()) {
                tracing::warn!("Failed to open browser, visit the URL manually: {}", e);
            }
        }

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.listen_for_callback(listener))
                .await
                .map_err(|_| AuthError::Login {
                    message: format!("no callback received within {}s", limit.as_secs()),
                })?,
            None => self.listen_for_callback(listener).await,
        }
    }
}

fn parse_callback_request(request: &str) -> CallbackRequest {
    let Some(target) = request.lines().next().and_then(|line| {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("GET"), Some(target)) => Some(target),
            _ => None,
        }
    }) else {
        return CallbackRequest::Malformed;
    };

    let Ok(url) = Url::parse("http://127.0.0.1/").and_then(|base| base.join(target)) else {
        return CallbackRequest::Malformed;
    };

    if url.path() != "/callback" {
        return CallbackRequest::OtherPath;
    }

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match &*key {
            "error" => return CallbackRequest::Denied(value.into_owned()),
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            _ => {}
        }
    }

    code.map(CallbackRequest::Code)
        .unwrap_or(CallbackRequest::MissingCode)
}

async fn respond(socket: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    if let Err(e) = socket.write_all(response.as_bytes()).await {
        tracing::debug!("Failed to write callback response: {}", e);
        return;
    }
    let _ = socket.flush().await;
    let _ = socket.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(port: u16) -> LoginFlow {
        LoginFlow::new(
            ProviderConfig::spotify()
                .with_auth_url("https://example.com/authorize")
                .with_callback_port(port),
            "client-id",
        )
        .with_browser(false)
    }

    async fn send(addr: std::net::SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[test]
    fn test_authorization_url() {
        let url = flow(8000).authorization_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(url.host_str(), Some("example.com"));
        assert!(pairs.contains(&("client_id".into(), "client-id".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&(
            "redirect_uri".into(),
            "http://127.0.0.1:8000/callback".into()
        )));
        assert!(pairs.contains(&(
            "scope".into(),
            "user-read-playback-state user-modify-playback-state".into()
        )));
    }

    #[test]
    fn test_parse_callback_request() {
        assert_eq!(
            parse_callback_request("GET /callback?code=abc%2Fdef HTTP/1.1\r\nHost: x\r\n\r\n"),
            CallbackRequest::Code("abc/def".to_string())
        );
        assert_eq!(
            parse_callback_request("GET /callback?error=access_denied HTTP/1.1\r\n\r\n"),
            CallbackRequest::Denied("access_denied".to_string())
        );
        assert_eq!(
            parse_callback_request("GET /favicon.ico HTTP/1.1\r\n\r\n"),
            CallbackRequest::OtherPath
        );
        assert_eq!(
            parse_callback_request("GET /callback HTTP/1.1\r\n\r\n"),
            CallbackRequest::MissingCode
        );
        assert_eq!(parse_callback_request(""), CallbackRequest::Malformed);
    }

    #[tokio::test]
    async fn test_listen_for_callback_captures_code() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let flow = flow(addr.port());

        let server = tokio::spawn(async move { flow.listen_for_callback(listener).await });

        let stray = send(addr, "GET /favicon.ico HTTP/1.1\r\n\r\n").await;
        assert!(stray.starts_with("HTTP/1.1 404"));

        let response = send(addr, "GET /callback?code=C1 HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("Login Success!"));

        assert_eq!(server.await.unwrap().unwrap(), "C1");
    }

    #[tokio::test]
    async fn test_idle_connection_does_not_block_callback() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let flow = flow(addr.port());

        let server = tokio::spawn(async move { flow.listen_for_callback(listener).await });

        // A speculative preconnect that never sends a request.
        let _idle = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let response = send(addr, "GET /callback?code=C1 HTTP/1.1\r\n\r\n").await;
        assert!(response.contains("Login Success!"));

        let code = tokio::time::timeout(Duration::from_secs(3), server)
            .await
            .expect("callback not captured while an idle connection was open")
            .unwrap()
            .unwrap();
        assert_eq!(code, "C1");
    }

    #[tokio::test]
    async fn test_listen_for_callback_provider_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let flow = flow(addr.port());

        let server = tokio::spawn(async move { flow.listen_for_callback(listener).await });
        send(addr, "GET /callback?error=access_denied HTTP/1.1\r\n\r\n").await;

        let result = server.await.unwrap();
        assert!(matches!(result, Err(AuthError::Login { .. })));
    }

    #[tokio::test]
    async fn test_obtain_code_times_out() {
        // Find a free port, then let the flow bind it itself.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let flow = flow(port).with_timeout(Some(Duration::from_millis(50)));

        let result = flow.obtain_code().await;
        assert!(matches!(result, Err(AuthError::Login { .. })));
    }
}
