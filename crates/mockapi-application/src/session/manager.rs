use mockapi_core::credential::{AccessToken, TokenResponse};
use mockapi_core::session::{SessionState, UserIdentity};
use mockapi_core::{MockApiError, Result};
use mockapi_infrastructure::CredentialStore;
use mockapi_interaction::{ApiClient, ApiRequest};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

/// Credential exchange endpoint.
pub const TOKEN_PATH: &str = "/token";
/// Identity of the token's owner.
pub const CURRENT_USER_PATH: &str = "/users/me";
/// Shown when a rejected login carries no `detail`.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";

/// Owns the bearer-token lifecycle.
///
/// `SessionManager` is the single writer of:
/// - the [`CredentialStore`] (memory + durable slot)
/// - the [`ApiClient`] default `Authorization` header
/// - the observable [`SessionState`]
///
/// All three change together inside one transition, so after any
/// `bootstrap`/`login`/`logout` the header equals the stored credential.
/// Subscribers are notified synchronously at the end of the transition.
pub struct SessionManager {
    store: Arc<CredentialStore>,
    client: Arc<ApiClient>,
    state: watch::Sender<SessionState>,
    /// Bumped whenever the credential changes. Lets late 401s from requests
    /// sent under an older credential leave a newer session alone.
    epoch: AtomicU64,
    transition: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<CredentialStore>, client: Arc<ApiClient>) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            store,
            client,
            state,
            epoch: AtomicU64::new(0),
            transition: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Current session state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Restores a persisted session at process start.
    ///
    /// The restored token is trusted optimistically; the first request that
    /// comes back 401/403 ends the session.
    pub fn bootstrap(&self) -> SessionState {
        let _guard = self.lock_transition();

        let restored = self.store.restore();
        self.client.set_auth_header(restored.as_ref());
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let next = match restored {
            Some(_) => {
                tracing::info!("[Session] Restored persisted session");
                SessionState::Authenticated(None)
            }
            None => {
                tracing::debug!("[Session] No persisted session");
                SessionState::Unauthenticated
            }
        };
        self.publish(next.clone());
        next
    }

    /// Exchanges `identifier`/`secret` for a bearer token.
    ///
    /// On failure the previous session (if any) is left untouched.
    ///
    /// # Errors
    ///
    /// - [`MockApiError::InvalidCredentials`] when the backend rejects the exchange
    /// - [`MockApiError::Network`] when the backend cannot be reached
    /// - [`MockApiError::Unauthorized`] if the new token is refused by `/users/me`
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<SessionState> {
        let request = ApiRequest::post(TOKEN_PATH)
            .form([("username", identifier), ("password", secret)]);

        let response = self.client.request(request).await.map_err(login_error)?;
        let body: TokenResponse = response.json().map_err(|e| {
            tracing::warn!("[Session] Token endpoint returned an unexpected body: {}", e);
            MockApiError::internal(format!("Unexpected token response: {}", e))
        })?;

        self.establish(body.access_token)?;
        tracing::info!("[Session] Logged in");

        match self.refresh_identity().await {
            Ok(_) => {}
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => tracing::warn!("[Session] Could not load user identity: {}", e),
        }
        Ok(self.state())
    }

    /// Ends the session locally. Idempotent; never fails.
    pub fn logout(&self) {
        let _guard = self.lock_transition();
        self.clear_locked();
    }

    /// Hook for any call site that observed a 401/403.
    pub fn on_unauthorized_response(&self) {
        let _guard = self.lock_transition();
        if self.store.get().is_some() {
            tracing::warn!("[Session] Backend rejected the credential, logging out");
        }
        self.clear_locked();
    }

    /// Awaits `call` and routes a 401/403 result to
    /// [`SessionManager::on_unauthorized_response`]. The error is returned
    /// unchanged.
    ///
    /// A rejection is ignored if the credential changed while the call was
    /// in flight: it was answered for a token that is no longer in use.
    pub async fn guard<T, F>(&self, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let result = call.await;

        if let Err(e) = &result
            && e.is_unauthorized()
        {
            let _guard = self.lock_transition();
            if self.epoch.load(Ordering::SeqCst) == epoch {
                tracing::warn!("[Session] Backend rejected the credential, logging out");
                self.clear_locked();
            } else {
                tracing::debug!("[Session] Ignoring rejection for a replaced credential");
            }
        }
        result
    }

    /// Fetches `/users/me` and attaches the identity to the session.
    pub async fn refresh_identity(&self) -> Result<UserIdentity> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let identity: UserIdentity = self
            .guard(self.client.get_json(CURRENT_USER_PATH))
            .await?;

        let _guard = self.lock_transition();
        if self.epoch.load(Ordering::SeqCst) == epoch {
            self.state.send_if_modified(|state| match state {
                SessionState::Authenticated(current) if current.as_ref() != Some(&identity) => {
                    *current = Some(identity.clone());
                    true
                }
                _ => false,
            });
        }
        Ok(identity)
    }

    fn establish(&self, token: AccessToken) -> Result<()> {
        let _guard = self.lock_transition();
        self.store.set(token.clone())?;
        self.client.set_auth_header(Some(&token));
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.publish(SessionState::Authenticated(None));
        Ok(())
    }

    /// Caller holds the transition lock.
    fn clear_locked(&self) {
        let had_credential = self.store.get().is_some();
        if let Err(e) = self.store.clear() {
            tracing::warn!("[Session] Could not clear the persisted credential: {}", e);
        }
        self.client.set_auth_header(None);
        if had_credential {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            tracing::info!("[Session] Logged out");
        }
        self.publish(SessionState::Unauthenticated);
    }

    fn publish(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn lock_transition(&self) -> MutexGuard<'_, ()> {
        self.transition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Maps a failed credential exchange to the error shown to the user.
fn login_error(err: MockApiError) -> MockApiError {
    match err {
        MockApiError::Unauthorized { detail, .. }
        | MockApiError::Http {
            status: 400..=499,
            detail,
        } => MockApiError::invalid_credentials(
            detail.unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string()),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_rejections_become_invalid_credentials() {
        let err = login_error(MockApiError::from_status(
            401,
            Some("Incorrect email or password".to_string()),
        ));
        assert_eq!(
            err,
            MockApiError::invalid_credentials("Incorrect email or password")
        );

        let err = login_error(MockApiError::from_status(422, None));
        assert_eq!(err, MockApiError::invalid_credentials(LOGIN_FAILED_MESSAGE));
    }

    #[test]
    fn test_login_error_keeps_network_and_server_errors() {
        assert!(login_error(MockApiError::network("refused")).is_network());
        assert_eq!(
            login_error(MockApiError::from_status(503, None)).status(),
            Some(503)
        );
    }
}
