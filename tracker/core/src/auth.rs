//! Auth State Controller
//!
//! Owns the authentication status shown to the user and mediates every call
//! to the [`AuthGateway`].
//!
//! # Design Philosophy
//!
//! Input is validated locally before the gateway is touched: blank fields
//! and short passwords never leave the process. Gateway failures are not
//! retried. Each one settles the state at `Unauthenticated` and publishes a
//! message.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::GatewayError;
use crate::gateway::AuthGateway;
use crate::models::User;
use crate::observable::StateCell;
use crate::scope::ControllerScope;

/// Shown when email or password is blank
pub const BLANK_CREDENTIALS_MESSAGE: &str = "Email and password must not be empty";
/// Shown when a sign-up password is too short
pub const SHORT_PASSWORD_MESSAGE: &str = "Password must be at least 6 characters";
/// Fallback when sign-up fails without a server message
pub const SIGN_UP_FAILED_MESSAGE: &str = "Sign-up failed";
/// Fallback when sign-in fails without a server message
pub const SIGN_IN_FAILED_MESSAGE: &str = "Sign-in failed";
/// Fallback when sign-out fails without a server message
pub const SIGN_OUT_FAILED_MESSAGE: &str = "Sign-out failed";

/// Minimum password length accepted by sign-up
pub const MIN_PASSWORD_LEN: usize = 6;

/// Authentication status
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Initial check for an existing session is running
    #[default]
    Loading,
    /// A user is signed in
    Authenticated,
    /// Nobody is signed in
    Unauthenticated,
    /// Terminal failure with a message
    ///
    /// Not produced by [`AuthController`], which reports failures through
    /// the error message and settles at `Unauthenticated`. Kept for
    /// surfaces that fold both into one value.
    Error(String),
}

impl AuthState {
    /// Whether a user is signed in
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// Which credential flow is running
#[derive(Clone, Copy, Debug)]
enum Flow {
    SignUp,
    SignIn,
}

impl Flow {
    fn fallback(self) -> &'static str {
        match self {
            Self::SignUp => SIGN_UP_FAILED_MESSAGE,
            Self::SignIn => SIGN_IN_FAILED_MESSAGE,
        }
    }
}

struct AuthInner<G> {
    gateway: Arc<G>,
    auth_state: StateCell<AuthState>,
    loading: StateCell<bool>,
    error_message: StateCell<Option<String>>,
    user: StateCell<Option<User>>,
}

impl<G: AuthGateway + 'static> AuthInner<G> {
    /// Local rejection: message set, state settles unless already signed in
    fn reject(&self, message: &str) {
        tracing::debug!(reason = message, "Credentials rejected locally");
        self.error_message.set(Some(message.to_string()));
        if !self.auth_state.get().is_authenticated() {
            self.auth_state.set(AuthState::Unauthenticated);
        }
    }

    /// Startup session check
    ///
    /// A sign-in, sign-up or sign-out that settles first wins; the check
    /// only resolves a state that is still `Loading`.
    async fn check_current_user(&self) {
        let (user, state) = match self.gateway.current_user().await {
            Ok(Some(user)) => (Some(user), AuthState::Authenticated),
            Ok(None) => (None, AuthState::Unauthenticated),
            Err(e) => {
                tracing::warn!(error = %e, "Session check failed");
                (None, AuthState::Unauthenticated)
            }
        };

        let applied = self.auth_state.update_if(|current| {
            if *current != AuthState::Loading {
                return false;
            }
            if let Some(user) = &user {
                tracing::info!(user_id = %user.id, "Restored session");
            }
            self.user.set(user);
            *current = state;
            true
        });
        if !applied {
            tracing::debug!("Session check superseded by a newer auth result");
        }
    }

    async fn authenticate(&self, flow: Flow, email: String, password: String) {
        self.loading.set(true);
        self.error_message.set(None);

        let result = match flow {
            Flow::SignUp => self.gateway.sign_up(&email, &password).await,
            Flow::SignIn => self.gateway.sign_in(&email, &password).await,
        };

        match result {
            Ok(user) => {
                tracing::info!(user_id = %user.id, ?flow, "Authenticated via {}", self.gateway.name());
                self.user.set(Some(user));
                self.auth_state.set(AuthState::Authenticated);
                self.error_message.set(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, ?flow, "Authentication failed");
                self.user.set(None);
                self.auth_state.set(AuthState::Unauthenticated);
                self.error_message.set(Some(message_or(&e, flow.fallback())));
            }
        }

        self.loading.set(false);
    }
}

fn message_or(err: &GatewayError, fallback: &str) -> String {
    err.user_message().unwrap_or_else(|| fallback.to_string())
}

/// Controller for sign-up, sign-in and sign-out
pub struct AuthController<G> {
    inner: Arc<AuthInner<G>>,
    scope: ControllerScope,
}

impl<G: AuthGateway + 'static> AuthController<G> {
    /// Create a controller and start checking for an existing session
    ///
    /// Must be called within a tokio runtime. The state is `Loading` until
    /// the check finishes.
    pub fn new(gateway: Arc<G>) -> Self {
        let controller = Self {
            inner: Arc::new(AuthInner {
                gateway,
                auth_state: StateCell::default(),
                loading: StateCell::new(false),
                error_message: StateCell::new(None),
                user: StateCell::new(None),
            }),
            scope: ControllerScope::new(),
        };

        let inner = Arc::clone(&controller.inner);
        controller
            .scope
            .spawn(async move { inner.check_current_user().await });

        controller
    }

    /// Subscribe to the authentication status
    pub fn auth_state(&self) -> watch::Receiver<AuthState> {
        self.inner.auth_state.subscribe()
    }

    /// Subscribe to the loading flag
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Subscribe to the error message
    pub fn error_message(&self) -> watch::Receiver<Option<String>> {
        self.inner.error_message.subscribe()
    }

    /// Current authentication status
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.inner.auth_state.get()
    }

    /// Current error message
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.error_message.get()
    }

    /// User recorded by the last successful sign-in, sign-up or session check
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.user.get()
    }

    /// Register a new account
    ///
    /// Returns `None` without contacting the gateway when a field is blank
    /// or the password is shorter than [`MIN_PASSWORD_LEN`].
    pub fn sign_up(&self, email: &str, password: &str) -> Option<JoinHandle<()>> {
        if email.trim().is_empty() || password.trim().is_empty() {
            self.inner.reject(BLANK_CREDENTIALS_MESSAGE);
            return None;
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            self.inner.reject(SHORT_PASSWORD_MESSAGE);
            return None;
        }
        Some(self.spawn_flow(Flow::SignUp, email, password))
    }

    /// Sign in to an existing account
    ///
    /// Returns `None` without contacting the gateway when a field is blank.
    pub fn sign_in(&self, email: &str, password: &str) -> Option<JoinHandle<()>> {
        if email.trim().is_empty() || password.trim().is_empty() {
            self.inner.reject(BLANK_CREDENTIALS_MESSAGE);
            return None;
        }
        Some(self.spawn_flow(Flow::SignIn, email, password))
    }

    /// Sign out; always ends `Unauthenticated`
    pub fn sign_out(&self) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        self.scope.spawn(async move {
            inner.loading.set(true);

            if let Err(e) = inner.gateway.sign_out().await {
                tracing::warn!(error = %e, "Sign-out failed");
                inner
                    .error_message
                    .set(Some(message_or(&e, SIGN_OUT_FAILED_MESSAGE)));
            } else {
                tracing::info!("Signed out");
            }

            inner.user.set(None);
            inner.auth_state.set(AuthState::Unauthenticated);
            inner.loading.set(false);
        })
    }

    /// Clear the error message; the state is untouched
    pub fn clear_error(&self) {
        self.inner.error_message.set(None);
    }

    fn spawn_flow(&self, flow: Flow, email: &str, password: &str) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        let email = email.trim().to_string();
        let password = password.to_string();
        self.scope
            .spawn(async move { inner.authenticate(flow, email, password).await })
    }
}
