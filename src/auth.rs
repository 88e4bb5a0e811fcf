use crate::api::{ApiClient, ClientError};
use crate::state::{Session, SessionPhase};
use crate::types::{AuthResponse, LoginCredentials, User};
use std::sync::Arc;
use tracing::{error, info, warn};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Please login again.";

pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    fn session(&self) -> &Session {
        self.api.session()
    }

    /// Exchanges credentials for a token pair, then loads the profile.
    ///
    /// On any failure the token keys are removed again and the session falls
    /// back to anonymous.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, ClientError> {
        self.session().set_phase(SessionPhase::Authenticating).await;

        match self.login_steps(credentials).await {
            Ok(user) => {
                self.session().set_phase(SessionPhase::Authenticated).await;
                info!(user_id = user.id, role = ?user.role, "logged in");
                Ok(user)
            }
            Err(e) => {
                if let Err(store_err) = self.session().clear_tokens().await {
                    warn!(error = %store_err, "failed to clear tokens after login failure");
                }
                self.session().set_phase(SessionPhase::Anonymous).await;
                error!(
                    username = %credentials.username,
                    reason = %e.user_message(LOGIN_FAILED_MESSAGE),
                    "login failed"
                );
                Err(e)
            }
        }
    }

    async fn login_steps(&self, credentials: &LoginCredentials) -> Result<User, ClientError> {
        let tokens: AuthResponse = self.api.post("auth/login", credentials).await?;
        self.session()
            .save_tokens(&tokens.access_token, Some(&tokens.refresh_token))
            .await?;
        self.current_user().await
    }

    /// Fetches `/auth/me` and caches the profile.
    pub async fn current_user(&self) -> Result<User, ClientError> {
        let user: User = self.api.get("auth/me").await.inspect_err(|e| {
            error!(error = %e, "failed to fetch user data");
        })?;
        self.session().save_user(&user).await?;
        Ok(user)
    }

    /// Explicit refresh. Failure logs the user out entirely before returning
    /// the error.
    pub async fn refresh_token(&self) -> Result<String, ClientError> {
        match self.api.exchange_refresh_token().await {
            Ok(token) => Ok(token),
            Err(e) => {
                warn!(error = %e, "session expired: {}", SESSION_EXPIRED_MESSAGE);
                self.logout().await;
                self.session().set_phase(SessionPhase::Expired).await;
                Err(e)
            }
        }
    }

    /// Removes the session and every stored application. Never fails; storage
    /// errors are logged.
    pub async fn logout(&self) {
        if let Err(e) = self.session().clear_all().await {
            warn!(error = %e, "failed to clear local storage on logout");
        }
        info!("logged out");
    }

    pub async fn stored_user(&self) -> Option<User> {
        self.session().stored_user().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    pub async fn access_token(&self) -> Option<String> {
        match self.session().access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "failed to read access token");
                None
            }
        }
    }
}
