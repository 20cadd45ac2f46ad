use std::path::{Path, PathBuf};

use reqwest::{header, Client, Method, RequestBuilder, Response};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::consent;
use super::credential::Credential;
use super::store::TokenStore;
use crate::config::ClientRegistration;

/// HTTP transport that signs every request with the current access token,
/// refreshing it first when it has expired.
pub struct AuthorizedTransport {
    http: Client,
    registration: ClientRegistration,
    credential: Mutex<Credential>,
    cache_path: Option<PathBuf>,
}

impl AuthorizedTransport {
    pub fn new(http: Client, registration: ClientRegistration, credential: Credential) -> Self {
        Self {
            http,
            registration,
            credential: Mutex::new(credential),
            cache_path: None,
        }
    }

    /// Write refreshed credentials back to the cache file at `path`
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// The underlying client, for building requests passed to [`send`](Self::send)
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url)
    }

    /// Snapshot of the current credential, without refreshing
    pub async fn credential(&self) -> Credential {
        self.credential.lock().await.clone()
    }

    /// Current access token, refreshed first if it has expired
    pub async fn access_token(&self) -> String {
        let mut credential = self.credential.lock().await;
        self.refresh_if_expired(&mut credential).await;
        credential.access_token.clone()
    }

    /// Attach the authorization header and send.
    ///
    /// Remote failures, including authorization errors from a stale token,
    /// are returned to the caller untouched.
    pub async fn send(&self, request: RequestBuilder) -> reqwest::Result<Response> {
        let authorization = {
            let mut credential = self.credential.lock().await;
            self.refresh_if_expired(&mut credential).await;
            credential.authorization_value()
        };

        request
            .header(header::AUTHORIZATION, authorization)
            .send()
            .await
    }

    async fn refresh_if_expired(&self, credential: &mut Credential) {
        if !credential.is_expired() {
            return;
        }

        if !credential.is_renewable() {
            warn!("Access token expired and no refresh token is available; sending stale token");
            return;
        }

        debug!("Access token expired, refreshing");
        match consent::refresh(&self.http, &self.registration, credential).await {
            Ok(renewed) => {
                *credential = renewed;
                info!("Access token refreshed");
                self.persist(credential).await;
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed; sending stale token");
            }
        }
    }

    /// Runs with the credential lock held, so concurrent senders wait for
    /// the write-back instead of racing it.
    async fn persist(&self, credential: &Credential) {
        let Some(ref path) = self.cache_path else {
            return;
        };
        let path = path.clone();
        let credential = credential.clone();
        let saved = tokio::task::spawn_blocking(move || TokenStore::save(&path, &credential)).await;
        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Failed to write refreshed credential back to cache"),
            Err(e) => warn!(error = %e, "Credential write-back task failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registration(server: &MockServer) -> ClientRegistration {
        ClientRegistration {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            scopes: vec!["scope-a".to_string()],
            auth_uri: format!("{}/auth", server.uri()),
            token_uri: format!("{}/token", server.uri()),
        }
    }

    fn expired(refresh_token: Option<&str>) -> Credential {
        let cred = Credential::new("tok1").with_expiry(Utc::now() - Duration::hours(1));
        match refresh_token {
            Some(r) => cred.with_refresh_token(r),
            None => cred,
        }
    }

    async fn mount_token_endpoint(server: &MockServer, access_token: &str, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": access_token,
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(calls)
            .mount(server)
            .await;
    }

    async fn mount_resource(server: &MockServer, bearer: &str) {
        Mock::given(method("GET"))
            .and(path("/resource"))
            .and(header_eq("authorization", format!("Bearer {}", bearer).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "unused", 0).await;
        mount_resource(&server, "tok1").await;

        let cred = Credential::new("tok1").with_expiry(Utc::now() + Duration::hours(1));
        let transport = AuthorizedTransport::new(Client::new(), registration(&server), cred);

        let url = format!("{}/resource", server.uri());
        let resp = transport.send(transport.request(Method::GET, &url)).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_refreshes_before_expired_request() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "tok2", 1).await;
        mount_resource(&server, "tok2").await;

        let transport =
            AuthorizedTransport::new(Client::new(), registration(&server), expired(Some("ref1")));

        let url = format!("{}/resource", server.uri());
        let resp = transport.send(transport.http().get(&url)).await.unwrap();
        assert_eq!(resp.status(), 200);

        let current = transport.credential().await;
        assert_eq!(current.access_token, "tok2");
        assert_eq!(current.refresh_token.as_deref(), Some("ref1"));
        assert!(!current.is_expired());
    }

    #[tokio::test]
    async fn test_refreshed_credential_is_persisted() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "tok2", 1).await;

        let home = tempfile::tempdir().unwrap();
        let cache = TokenStore::locate_in(home.path()).unwrap();
        TokenStore::save(&cache, &expired(Some("ref1"))).unwrap();

        let transport =
            AuthorizedTransport::new(Client::new(), registration(&server), expired(Some("ref1")))
                .with_cache_path(&cache);

        assert_eq!(transport.access_token().await, "tok2");
        let on_disk = TokenStore::load(&cache).unwrap();
        assert_eq!(on_disk, transport.credential().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_senders_share_one_refresh_and_write_back() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "tok2", 1).await;
        Mock::given(method("GET"))
            .and(path("/resource"))
            .and(header_eq("authorization", "Bearer tok2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(2)
            .mount(&server)
            .await;

        let home = tempfile::tempdir().unwrap();
        let cache = TokenStore::locate_in(home.path()).unwrap();
        TokenStore::save(&cache, &expired(Some("ref1"))).unwrap();

        let transport =
            AuthorizedTransport::new(Client::new(), registration(&server), expired(Some("ref1")))
                .with_cache_path(&cache);

        let url = format!("{}/resource", server.uri());
        let (a, b) = tokio::join!(
            transport.send(transport.http().get(&url)),
            transport.send(transport.http().get(&url)),
        );
        assert_eq!(a.unwrap().status(), 200);
        assert_eq!(b.unwrap().status(), 200);

        let on_disk = TokenStore::load(&cache).unwrap();
        assert_eq!(on_disk.access_token, "tok2");
        assert_eq!(on_disk, transport.credential().await);
    }

    #[tokio::test]
    async fn test_stale_token_sent_without_refresh_token() {
        let server = MockServer::start().await;
        mount_token_endpoint(&server, "unused", 0).await;
        mount_resource(&server, "tok1").await;

        let transport = AuthorizedTransport::new(Client::new(), registration(&server), expired(None));

        let url = format!("{}/resource", server.uri());
        transport.send(transport.http().get(&url)).await.unwrap();
        assert_eq!(transport.credential().await.access_token, "tok1");
    }

    #[tokio::test]
    async fn test_rejected_refresh_surfaces_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/resource"))
            .and(header_eq("authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let transport =
            AuthorizedTransport::new(Client::new(), registration(&server), expired(Some("ref1")));

        let url = format!("{}/resource", server.uri());
        let resp = transport.send(transport.http().get(&url)).await.unwrap();
        assert_eq!(resp.status(), 401);
        assert_eq!(transport.credential().await.access_token, "tok1");
    }
}
