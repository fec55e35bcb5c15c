//! Authenticated gateway to the vault server.

use serde::de::DeserializeOwned;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use vaultsync_common::{Error, Result, Session, TokenPair};
use vaultsync_storage::{SessionStore, StoreKey};

use crate::config::ApiConfig;
use crate::logout::{LogoutHook, LogoutReason, StoreTeardown};
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method};
use crate::types::{
    AuthLogEntry, RefreshResponse, SessionDescriptor, StatusResponse, TokenBody,
    UploadResponse, VaultResponse, VaultTransfer,
};

/// Header identifying the client product and version on every request.
pub const CLIENT_IDENTITY_HEADER: &str = "X-Client-Identity";

pub const STATUS_ENDPOINT: &str = "Auth/status";
pub const REFRESH_ENDPOINT: &str = "Auth/refresh";
pub const REVOKE_ENDPOINT: &str = "Auth/revoke";
pub const VAULT_ENDPOINT: &str = "Vault";
pub const SESSIONS_ENDPOINT: &str = "Security/sessions";
pub const AUTH_LOGS_ENDPOINT: &str = "Security/authlogs";

/// Message carried by `SessionExpired` after a failed refresh.
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Authenticated access to the server with transparent token refresh.
///
/// A 401 triggers exactly one refresh and one replay. Refresh is
/// single-flight: concurrent 401s wait for the refresh in progress and reuse
/// its result, since refresh tokens are single-use.
pub struct AuthGateway {
    config: ApiConfig,
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn HttpTransport>,
    logout_hook: Arc<dyn LogoutHook>,
    refresh_gate: Mutex<()>,
}

impl AuthGateway {
    /// Create a gateway with an explicit logout hook.
    pub fn new(
        config: ApiConfig,
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn HttpTransport>,
        logout_hook: Arc<dyn LogoutHook>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
            logout_hook,
            refresh_gate: Mutex::new(()),
        }
    }

    /// Create a gateway whose logout clears every key in `store`.
    pub fn with_store_teardown(
        config: ApiConfig,
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let hook = Arc::new(StoreTeardown::new(store.clone()));
        Self::new(config, store, transport, hook)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Persist the durable tier after an external login.
    pub async fn begin_session(&self, session: &Session) -> Result<()> {
        let mut entries = vec![
            (StoreKey::Username, session.username.clone()),
            (StoreKey::AccessToken, session.tokens.access_token.clone()),
            (StoreKey::RefreshToken, session.tokens.refresh_token.clone()),
        ];
        let removed: &[StoreKey] = match &session.api_base_url {
            Some(url) => {
                entries.push((StoreKey::ApiBaseUrl, url.clone()));
                &[]
            }
            None => &[StoreKey::ApiBaseUrl],
        };
        self.store.apply(entries, removed).await?;

        info!("Session started for {}", session.username);
        Ok(())
    }

    /// Get the stored token pair, if both halves are present.
    pub async fn current_tokens(&self) -> Result<Option<TokenPair>> {
        let access = self.store.get(StoreKey::AccessToken).await?;
        let refresh = self.store.get(StoreKey::RefreshToken).await?;
        Ok(match (access, refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        })
    }

    async fn base_url(&self) -> Result<String> {
        Ok(self
            .store
            .get(StoreKey::ApiBaseUrl)
            .await?
            .unwrap_or_else(|| self.config.base_url.clone()))
    }

    /// Send an unauthenticated request, or one with an explicit bearer token.
    ///
    /// Never refreshes. Every request carries the client-identity header.
    pub async fn raw_fetch(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<ApiResponse> {
        let url = self.config.endpoint_url(&self.base_url().await?, endpoint)?;

        let mut headers = vec![(
            CLIENT_IDENTITY_HEADER.to_string(),
            self.config.client_identity(),
        )];
        if let Some(token) = bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
        }

        self.transport
            .send(ApiRequest {
                method,
                url,
                headers,
                body,
            })
            .await
    }

    /// Send a request with the stored access token.
    ///
    /// # Postconditions
    /// - On 401, the token pair has been refreshed once and the request
    ///   replayed once; the replay's response is returned as is
    ///
    /// # Errors
    /// - `SessionExpired` if the refresh failed; the session is logged out
    /// - `ServerUnreachable` on transport failure
    pub async fn auth_fetch(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ApiResponse> {
        let token = self.store.get(StoreKey::AccessToken).await?;
        let response = self
            .raw_fetch(method, endpoint, body.clone(), token.as_deref())
            .await?;

        if !response.is_unauthorized() {
            return Ok(response);
        }

        debug!("{} rejected with 401, refreshing token pair", endpoint);
        let tokens = self.refresh_after(token.as_deref()).await?;

        self.raw_fetch(method, endpoint, body, Some(&tokens.access_token))
            .await
    }

    /// Refresh the token pair.
    ///
    /// # Postconditions
    /// - The new pair is persisted as one batch before it is returned
    ///
    /// # Errors
    /// - `SessionExpired` on any failure; the session is logged out
    pub async fn refresh(&self) -> Result<TokenPair> {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked().await
    }

    /// Refresh unless another task already replaced the `stale` access token.
    async fn refresh_after(&self, stale: Option<&str>) -> Result<TokenPair> {
        let _gate = self.refresh_gate.lock().await;

        // Double-check after acquiring the gate
        match (self.store.get(StoreKey::AccessToken).await?, stale) {
            // Torn down by the refresh this request waited on
            (None, Some(_)) => {
                return Err(Error::SessionExpired(SESSION_EXPIRED_MESSAGE.to_string()));
            }
            (Some(current), stale) => {
                let replaced = stale.map_or(true, |stale| {
                    !bool::from(stale.as_bytes().ct_eq(current.as_bytes()))
                });
                if replaced {
                    if let Some(tokens) = self.current_tokens().await? {
                        debug!("Token pair already refreshed by a concurrent request");
                        return Ok(tokens);
                    }
                }
            }
            (None, None) => {}
        }

        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<TokenPair> {
        match self.exchange_refresh_token().await {
            Ok(tokens) => {
                self.store
                    .set_many(vec![
                        (StoreKey::AccessToken, tokens.access_token.clone()),
                        (StoreKey::RefreshToken, tokens.refresh_token.clone()),
                    ])
                    .await?;
                info!("Token pair refreshed");
                Ok(tokens)
            }
            Err(err) => {
                warn!("Token refresh failed: {}", err);
                self.expire_session().await;
                Err(Error::SessionExpired(SESSION_EXPIRED_MESSAGE.to_string()))
            }
        }
    }

    async fn exchange_refresh_token(&self) -> Result<TokenPair> {
        let tokens = self
            .current_tokens()
            .await?
            .ok_or_else(|| Error::SessionExpired("No token pair stored".to_string()))?;

        let body = serde_json::to_value(TokenBody {
            token: &tokens.access_token,
            refresh_token: &tokens.refresh_token,
        })?;

        let response = self
            .raw_fetch(Method::Post, REFRESH_ENDPOINT, Some(body), None)
            .await?;
        if !response.is_success() {
            return Err(response.into_error());
        }

        let refreshed: RefreshResponse = response.parse()?;
        Ok(TokenPair::new(refreshed.token, refreshed.refresh_token))
    }

    /// Probe server health and compatibility.
    ///
    /// Transport failures and unexpected responses are downgraded to
    /// [`StatusResponse::unavailable`] so periodic checks never fail.
    ///
    /// # Errors
    /// - `SessionExpired` if the session is invalid; the session is logged out
    pub async fn get_status(&self) -> Result<StatusResponse> {
        let response = match self.auth_fetch(Method::Get, STATUS_ENDPOINT, None).await {
            Ok(response) => response,
            Err(err @ Error::SessionExpired(_)) => return Err(err),
            Err(err) => {
                warn!("Status probe failed, reporting server unavailable: {}", err);
                return Ok(StatusResponse::unavailable());
            }
        };

        if response.is_success() {
            return Ok(response.parse().unwrap_or_else(|err| {
                warn!("Unreadable status response: {}", err);
                StatusResponse::unavailable()
            }));
        }

        let message = response.error_message();
        if indicates_session_expired(&message) {
            self.expire_session().await;
            return Err(Error::SessionExpired(message));
        }

        warn!(
            "Status probe answered {}, reporting server unavailable",
            response.status
        );
        Ok(StatusResponse::unavailable())
    }

    /// Fetch the full vault resource.
    pub async fn fetch_vault(&self) -> Result<VaultResponse> {
        self.auth_json(Method::Get, VAULT_ENDPOINT).await
    }

    /// Upload a vault transfer object.
    ///
    /// # Errors
    /// - `UploadRejected` if the server answers with a non-success status
    /// - `ServerUnreachable` on transport failure
    pub async fn upload_vault(&self, transfer: &VaultTransfer) -> Result<UploadResponse> {
        let body = serde_json::to_value(transfer)?;
        let response = self
            .auth_fetch(Method::Post, VAULT_ENDPOINT, Some(body))
            .await?;

        if !response.is_success() {
            return Err(Error::UploadRejected(response.error_message()));
        }
        response.parse()
    }

    /// List active login sessions of the account.
    pub async fn list_sessions(&self) -> Result<Vec<SessionDescriptor>> {
        self.auth_json(Method::Get, SESSIONS_ENDPOINT).await
    }

    /// Revoke one login session by id.
    pub async fn revoke_session(&self, session_id: &str) -> Result<()> {
        if session_id.is_empty() || session_id.contains('/') {
            return Err(Error::InvalidInput(format!(
                "Invalid session id '{}'",
                session_id
            )));
        }

        let endpoint = format!("{}/{}", SESSIONS_ENDPOINT, session_id);
        let response = self.auth_fetch(Method::Delete, &endpoint, None).await?;
        if !response.is_success() {
            return Err(response.into_error());
        }
        Ok(())
    }

    /// Fetch the authentication log of the account.
    pub async fn auth_logs(&self) -> Result<Vec<AuthLogEntry>> {
        self.auth_json(Method::Get, AUTH_LOGS_ENDPOINT).await
    }

    async fn auth_json<T: DeserializeOwned>(&self, method: Method, endpoint: &str) -> Result<T> {
        let response = self.auth_fetch(method, endpoint, None).await?;
        if !response.is_success() {
            return Err(response.into_error());
        }
        response.parse()
    }

    /// Log out: revoke server-side, then tear down local state.
    ///
    /// Revocation is best effort. Teardown always runs.
    pub async fn logout(&self, reason: LogoutReason) -> Result<()> {
        if let Err(err) = self.revoke_tokens().await {
            warn!("Token revocation failed, continuing logout: {}", err);
        }
        self.logout_hook.teardown(reason).await
    }

    async fn revoke_tokens(&self) -> Result<()> {
        let Some(tokens) = self.current_tokens().await? else {
            debug!("No token pair to revoke");
            return Ok(());
        };

        let body = serde_json::to_value(TokenBody {
            token: &tokens.access_token,
            refresh_token: &tokens.refresh_token,
        })?;

        let response = self
            .raw_fetch(
                Method::Post,
                REVOKE_ENDPOINT,
                Some(body),
                Some(&tokens.access_token),
            )
            .await?;
        if !response.is_success() {
            return Err(response.into_error());
        }
        Ok(())
    }

    async fn expire_session(&self) {
        if let Err(err) = self.logout(LogoutReason::SessionExpired).await {
            error!("Failed to clear expired session: {}", err);
        }
    }
}

fn indicates_session_expired(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("session expired") || message.contains("session has expired")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::validate::validate_status_response;
    use serde_json::json;
    use std::time::Duration;
    use vaultsync_common::ValidationIssue;
    use vaultsync_storage::MemoryStore;

    const BASE: &str = "https://vault.test";

    async fn setup(access: &str, refresh: &str) -> (AuthGateway, MemoryStore, MockTransport) {
        let store = MemoryStore::new();
        store
            .set_many(vec![
                (StoreKey::Username, "alice".to_string()),
                (StoreKey::AccessToken, access.to_string()),
                (StoreKey::RefreshToken, refresh.to_string()),
                (StoreKey::VaultBlob, "blob".to_string()),
                (StoreKey::DerivedKey, "key".to_string()),
            ])
            .await
            .unwrap();

        let mock = MockTransport::new();
        let config = ApiConfig {
            base_url: BASE.to_string(),
            ..ApiConfig::default()
        };
        let gateway = AuthGateway::with_store_teardown(
            config,
            Arc::new(store.clone()),
            Arc::new(mock.clone()),
        );
        (gateway, store, mock)
    }

    fn status_body() -> serde_json::Value {
        json!({"clientVersionSupported": true, "serverVersion": "1.2.0", "vaultRevision": 5})
    }

    /// Status route that only accepts the `valid` access token.
    fn status_requiring(mock: &MockTransport, valid: &'static str) {
        mock.handle(Method::Get, STATUS_ENDPOINT, move |request| {
            let expected = format!("Bearer {}", valid);
            if request.header("Authorization") == Some(expected.as_str()) {
                Ok(ApiResponse::json(200, &status_body()))
            } else {
                Ok(ApiResponse::empty(401))
            }
        });
    }

    fn refresh_to(mock: &MockTransport, access: &str, refresh: &str) {
        mock.respond(
            Method::Post,
            REFRESH_ENDPOINT,
            ApiResponse::json(200, &json!({"token": access, "refreshToken": refresh})),
        );
    }

    #[tokio::test]
    async fn test_auth_fetch_sends_bearer_and_identity() {
        let (gateway, _store, mock) = setup("access-1", "refresh-1").await;
        status_requiring(&mock, "access-1");

        let response = gateway
            .auth_fetch(Method::Get, STATUS_ENDPOINT, None)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let request = &mock.requests()[0];
        assert_eq!(request.header("Authorization"), Some("Bearer access-1"));
        assert_eq!(
            request.header(CLIENT_IDENTITY_HEADER),
            Some(gateway.config().client_identity().as_str())
        );
        assert_eq!(request.url.as_str(), "https://vault.test/api/v1/Auth/status");
    }

    #[tokio::test]
    async fn test_refresh_is_transparent() {
        let (gateway, store, mock) = setup("stale", "refresh-1").await;
        status_requiring(&mock, "fresh");
        refresh_to(&mock, "fresh", "refresh-2");

        let refreshed = gateway
            .auth_fetch(Method::Get, STATUS_ENDPOINT, None)
            .await
            .unwrap();

        let (pre_refreshed_gateway, _, pre_mock) = setup("fresh", "refresh-2").await;
        status_requiring(&pre_mock, "fresh");
        let direct = pre_refreshed_gateway
            .auth_fetch(Method::Get, STATUS_ENDPOINT, None)
            .await
            .unwrap();

        assert_eq!(refreshed, direct);
        assert_eq!(mock.count(Method::Post, REFRESH_ENDPOINT), 1);
        assert_eq!(
            store.get(StoreKey::AccessToken).await.unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(
            store.get(StoreKey::RefreshToken).await.unwrap().as_deref(),
            Some("refresh-2")
        );

        let refresh_request = mock
            .requests()
            .into_iter()
            .find(|r| r.url.path().ends_with(REFRESH_ENDPOINT))
            .unwrap();
        assert_eq!(
            refresh_request.body,
            Some(json!({"token": "stale", "refreshToken": "refresh-1"}))
        );
        assert_eq!(refresh_request.header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_failed_refresh_logs_out() {
        let (gateway, store, mock) = setup("stale", "refresh-1").await;
        status_requiring(&mock, "fresh");
        mock.respond(
            Method::Post,
            REFRESH_ENDPOINT,
            ApiResponse::json(400, &json!({"message": "Invalid refresh token"})),
        );

        let result = gateway.auth_fetch(Method::Get, VAULT_ENDPOINT, None).await;

        assert!(matches!(result, Err(Error::SessionExpired(_))));
        assert!(store.present_keys().await.is_empty());
        assert_eq!(mock.count(Method::Post, REVOKE_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_unreachable_refresh_logs_out() {
        let (gateway, store, mock) = setup("stale", "refresh-1").await;
        status_requiring(&mock, "fresh");
        mock.fail(Method::Post, REFRESH_ENDPOINT);

        let result = gateway.refresh().await;

        assert!(matches!(result, Err(Error::SessionExpired(_))));
        assert!(store.present_keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_replay_failure_is_not_retried() {
        let (gateway, store, mock) = setup("stale", "refresh-1").await;
        mock.respond(Method::Get, VAULT_ENDPOINT, ApiResponse::empty(401));
        refresh_to(&mock, "fresh", "refresh-2");

        let result = gateway.fetch_vault().await;

        assert!(matches!(result, Err(Error::Api { status: 401, .. })));
        assert_eq!(mock.count(Method::Post, REFRESH_ENDPOINT), 1);
        assert_eq!(mock.count(Method::Get, VAULT_ENDPOINT), 2);
        assert!(store.get(StoreKey::AccessToken).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let (gateway, _store, mock) = setup("stale", "refresh-1").await;
        status_requiring(&mock, "fresh");
        refresh_to(&mock, "fresh", "refresh-2");
        mock.delay(Method::Post, REFRESH_ENDPOINT, Duration::from_millis(50));

        let calls = (0..5).map(|_| gateway.auth_fetch(Method::Get, STATUS_ENDPOINT, None));
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert_eq!(result.unwrap().status, 200);
        }
        assert_eq!(mock.count(Method::Post, REFRESH_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_failed_refresh() {
        let (gateway, store, mock) = setup("stale", "refresh-1").await;
        status_requiring(&mock, "fresh");
        mock.respond(
            Method::Post,
            REFRESH_ENDPOINT,
            ApiResponse::json(400, &json!({"message": "Refresh token reused"})),
        );
        mock.delay(Method::Post, REFRESH_ENDPOINT, Duration::from_millis(50));

        let calls = (0..5).map(|_| gateway.auth_fetch(Method::Get, STATUS_ENDPOINT, None));
        let results = futures::future::join_all(calls).await;

        for result in results {
            assert!(matches!(result, Err(Error::SessionExpired(_))));
        }
        assert_eq!(mock.count(Method::Post, REFRESH_ENDPOINT), 1);
        assert!(store.present_keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_refresh_token_logs_out() {
        let store = MemoryStore::new();
        store
            .set_many(vec![
                (StoreKey::Username, "alice".to_string()),
                (StoreKey::AccessToken, "access-1".to_string()),
                (StoreKey::VaultBlob, "blob".to_string()),
            ])
            .await
            .unwrap();
        let mock = MockTransport::new();
        mock.respond(Method::Get, STATUS_ENDPOINT, ApiResponse::empty(401));
        let gateway = AuthGateway::with_store_teardown(
            ApiConfig::default(),
            Arc::new(store.clone()),
            Arc::new(mock.clone()),
        );

        let result = gateway.auth_fetch(Method::Get, STATUS_ENDPOINT, None).await;

        assert!(matches!(result, Err(Error::SessionExpired(_))));
        assert!(store.present_keys().await.is_empty());
        assert_eq!(mock.count(Method::Post, REFRESH_ENDPOINT), 0);
    }

    #[tokio::test]
    async fn test_status_degrades_when_unreachable() {
        let (gateway, store, mock) = setup("access-1", "refresh-1").await;
        mock.set_offline(true);

        let status = gateway.get_status().await.unwrap();

        assert_eq!(status, StatusResponse::unavailable());
        assert_eq!(status.server_version, "0.0.0");
        assert_eq!(
            validate_status_response(&status, gateway.config()),
            Some(ValidationIssue::ServerUnavailable)
        );
        assert!(store.get(StoreKey::AccessToken).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_status_session_expired_logs_out() {
        let (gateway, store, mock) = setup("access-1", "refresh-1").await;
        mock.respond(
            Method::Get,
            STATUS_ENDPOINT,
            ApiResponse::json(403, &json!({"message": "Session expired"})),
        );

        let result = gateway.get_status().await;

        assert!(matches!(result, Err(Error::SessionExpired(_))));
        assert!(store.present_keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_status_server_error_degrades() {
        let (gateway, _store, mock) = setup("access-1", "refresh-1").await;
        mock.respond(Method::Get, STATUS_ENDPOINT, ApiResponse::empty(502));

        let status = gateway.get_status().await.unwrap();
        assert!(status.is_unavailable());
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_revoke_fails() {
        let (gateway, store, mock) = setup("access-1", "refresh-1").await;
        mock.fail(Method::Post, REVOKE_ENDPOINT);

        gateway.logout(LogoutReason::UserRequested).await.unwrap();

        assert!(store.present_keys().await.is_empty());
        assert_eq!(mock.count(Method::Post, REVOKE_ENDPOINT), 1);
    }

    #[tokio::test]
    async fn test_logout_revokes_current_pair() {
        let (gateway, store, mock) = setup("access-1", "refresh-1").await;
        mock.respond(Method::Post, REVOKE_ENDPOINT, ApiResponse::empty(204));

        gateway.logout(LogoutReason::UserRequested).await.unwrap();

        let revoke = &mock.requests()[0];
        assert_eq!(
            revoke.body,
            Some(json!({"token": "access-1", "refreshToken": "refresh-1"}))
        );
        assert!(store.present_keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_stored_base_url_overrides_config() {
        let (gateway, store, mock) = setup("access-1", "refresh-1").await;
        store
            .set(StoreKey::ApiBaseUrl, "https://self-hosted.example".to_string())
            .await
            .unwrap();
        mock.respond(Method::Get, SESSIONS_ENDPOINT, ApiResponse::json(200, &json!([])));

        gateway.list_sessions().await.unwrap();

        assert_eq!(
            mock.requests()[0].url.as_str(),
            "https://self-hosted.example/api/v1/Security/sessions"
        );
    }

    #[tokio::test]
    async fn test_security_endpoints() {
        let (gateway, _store, mock) = setup("access-1", "refresh-1").await;
        mock.respond(
            Method::Get,
            SESSIONS_ENDPOINT,
            ApiResponse::json(
                200,
                &json!([{"id": "s1", "deviceName": "Laptop", "isCurrent": true}]),
            ),
        );
        mock.respond(
            Method::Get,
            AUTH_LOGS_ENDPOINT,
            ApiResponse::json(
                200,
                &json!([{"timestamp": "2026-01-02T03:04:05Z", "eventType": "login", "success": true}]),
            ),
        );
        mock.respond(
            Method::Delete,
            "Security/sessions/s1",
            ApiResponse::empty(204),
        );

        let sessions = gateway.list_sessions().await.unwrap();
        assert_eq!(sessions[0].device_name.as_deref(), Some("Laptop"));
        assert!(sessions[0].is_current);

        let logs = gateway.auth_logs().await.unwrap();
        assert_eq!(logs[0].event_type, "login");

        gateway.revoke_session("s1").await.unwrap();
        assert_eq!(mock.count(Method::Delete, "Security/sessions/s1"), 1);

        assert!(gateway.revoke_session("../x").await.is_err());
    }

    #[tokio::test]
    async fn test_upload_rejection() {
        let (gateway, _store, mock) = setup("access-1", "refresh-1").await;
        mock.respond(
            Method::Post,
            VAULT_ENDPOINT,
            ApiResponse::json(400, &json!({"message": "Blob too large"})),
        );

        let result = gateway.upload_vault(&VaultTransfer::default()).await;
        match result {
            Err(Error::UploadRejected(message)) => assert_eq!(message, "Blob too large"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_begin_session_persists_durable_tier() {
        let store = MemoryStore::new();
        store
            .set(StoreKey::ApiBaseUrl, "https://old.example".to_string())
            .await
            .unwrap();
        let gateway = AuthGateway::with_store_teardown(
            ApiConfig::default(),
            Arc::new(store.clone()),
            Arc::new(MockTransport::new()),
        );

        gateway
            .begin_session(&Session {
                username: "bob".to_string(),
                tokens: TokenPair::new("a", "r"),
                api_base_url: None,
            })
            .await
            .unwrap();

        assert_eq!(
            store.present_keys().await,
            vec![StoreKey::Username, StoreKey::AccessToken, StoreKey::RefreshToken]
        );
        assert_eq!(
            gateway.current_tokens().await.unwrap(),
            Some(TokenPair::new("a", "r"))
        );

        gateway
            .begin_session(&Session {
                username: "bob".to_string(),
                tokens: TokenPair::new("a2", "r2"),
                api_base_url: Some("https://self-hosted.example".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(
            store.get(StoreKey::ApiBaseUrl).await.unwrap().as_deref(),
            Some("https://self-hosted.example")
        );
    }

    #[test]
    fn test_session_expiry_detection() {
        assert!(indicates_session_expired("Session expired"));
        assert!(indicates_session_expired("Your session has expired"));
        assert!(!indicates_session_expired("Internal error"));
    }
}
