use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};

use crate::config::SessionConfig;
use crate::error::{AppError, AppResult, FieldError, ValidationErrors};
use crate::models::{User, UserType};
use crate::services::api::{CalendarApi, LoginRequest, SignupRequest};
use crate::services::token_store::{StoredToken, TokenStore};
use crate::services::validation::{validate_login, validate_signup, LoginForm, SignupForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    /// A signup or login request is in flight.
    Pending,
    Authenticated,
}

/// Owns the current identity and the persisted token. All changes go
/// through `signup`, `login`, `logout` and `refresh`.
pub struct SessionService {
    api: Arc<dyn CalendarApi>,
    tokens: Arc<dyn TokenStore>,
    token_ttl: Duration,
    bcrypt_cost: u32,
    user: User,
    state: SessionState,
}

impl SessionService {
    pub fn new(
        api: Arc<dyn CalendarApi>,
        tokens: Arc<dyn TokenStore>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            api,
            tokens,
            token_ttl: Duration::days(config.token_expiry_days),
            bcrypt_cost: config.bcrypt_cost,
            user: User::anonymous(),
            state: SessionState::Anonymous,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_logged_in(&self) -> bool {
        self.state == SessionState::Authenticated && self.user.is_logged_in()
    }

    /// Token to attach to authenticated requests, if one is stored and fresh.
    pub fn token(&self) -> Option<String> {
        match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read stored session token: {}", e);
                None
            }
        }
    }

    /// Validate, hash the password, register the account and store the
    /// returned identity and token. Nothing is sent when validation fails.
    pub async fn signup(&mut self, form: &SignupForm) -> AppResult<&User> {
        validate_signup(form).into_result()?;

        let previous = self.state;
        self.state = SessionState::Pending;

        let password = match bcrypt::hash(&form.password, self.bcrypt_cost) {
            Ok(hash) => hash,
            Err(e) => {
                self.state = previous;
                return Err(e.into());
            }
        };
        let request = SignupRequest {
            email: form.email.clone(),
            username: form.username.clone(),
            password,
            user_type: UserType::User,
        };

        let result = match self.api.signup(&request).await {
            Ok(result) => result,
            Err(e) => {
                self.state = previous;
                return Err(Self::surface("signup", e));
            }
        };

        if let Err(e) = self.store_token(&result.token) {
            self.state = previous;
            return Err(e);
        }
        self.user = User {
            id: result.id,
            username: request.username,
            email: request.email,
            user_type: UserType::User,
            events: Vec::new(),
        };
        self.state = SessionState::Authenticated;
        info!("Signed up as {}", self.user.username);
        Ok(&self.user)
    }

    /// Validate and submit credentials. The server checks the password; the
    /// client only stores what it sends back.
    pub async fn login(&mut self, form: &LoginForm) -> AppResult<&User> {
        validate_login(form).into_result()?;

        let previous = self.state;
        self.state = SessionState::Pending;

        let request = LoginRequest {
            email: form.email.clone(),
            password: form.password.clone(),
        };
        let result = match self.api.login(&request).await {
            Ok(result) => result,
            Err(e) => {
                self.state = previous;
                return Err(Self::surface("login", e));
            }
        };

        let (user, token) = result.into_parts();
        if let Err(e) = self.store_token(&token) {
            self.state = previous;
            return Err(e);
        }
        self.user = user;
        self.state = SessionState::Authenticated;
        info!("Logged in as {}", self.user.username);
        Ok(&self.user)
    }

    /// Back to the anonymous identity; the stored token is discarded.
    pub fn logout(&mut self) -> AppResult<()> {
        self.user = User::anonymous();
        self.state = SessionState::Anonymous;
        self.tokens.clear()?;
        info!("Logged out");
        Ok(())
    }

    /// Reload the identity for a stored token. Returns whether a user was
    /// loaded; failures are logged and leave the session as it was.
    pub async fn refresh(&mut self) -> bool {
        let Some(token) = self.token() else {
            return false;
        };

        match self.api.update_from_server(&token).await {
            Ok(user) => {
                self.user = user;
                self.state = SessionState::Authenticated;
                true
            }
            Err(AppError::Unauthorized) => {
                warn!("Stored session token was rejected");
                false
            }
            Err(e) => {
                error!("Server did not respond: {}", e);
                false
            }
        }
    }

    /// Record an event the user just created.
    pub fn track_event(&mut self, id: &str) {
        if self.user.is_logged_in() && !self.user.events.iter().any(|e| e == id) {
            self.user.events.push(id.to_string());
        }
    }

    pub fn forget_event(&mut self, id: &str) {
        self.user.events.retain(|e| e != id);
    }

    fn store_token(&self, token: &str) -> AppResult<()> {
        self.tokens.save(&StoredToken::new(token, self.token_ttl))
    }

    /// Server rejections that point at a form field become field errors;
    /// transport failures are logged.
    fn surface(action: &str, err: AppError) -> AppError {
        match err {
            AppError::Api {
                message,
                location: Some(location),
                ..
            } => AppError::Validation(ValidationErrors::from(FieldError::new(location, message))),
            e if e.is_transport() => {
                error!("{} request failed: {}", action, e);
                e
            }
            e => {
                warn!("{} rejected: {}", action, e);
                e
            }
        }
    }
}
