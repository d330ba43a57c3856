//! Sign-in state and post-sign-in navigation.

pub mod navigation;
pub mod session;

use tracing::{info, warn};

use crate::error::TaskdeckError;
use crate::models::User;

pub use navigation::{resolve_navigation, Location};
pub use session::{IdentityProvider, SessionFile};

/// What the identity provider reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResult {
    SignedIn(User),
    SignedOut,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated(User),
    AuthFailed(String),
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated(_) => "authenticated",
            Self::AuthFailed(_) => "auth_failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    state: AuthState,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    pub fn new() -> Self {
        Self {
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Unauthenticated | AuthFailed → Authenticating.
    pub fn begin(&mut self) -> Result<(), TaskdeckError> {
        match self.state {
            AuthState::Unauthenticated | AuthState::AuthFailed(_) => {
                self.state = AuthState::Authenticating;
                Ok(())
            }
            _ => Err(TaskdeckError::invalid_transition(
                self.state.as_str(),
                AuthState::Authenticating.as_str(),
            )),
        }
    }

    /// Authenticating → Authenticated | Unauthenticated | AuthFailed.
    ///
    /// Returns the navigation target, or `None` when the provider failed and
    /// the user should stay where they are.
    pub fn complete(
        &mut self,
        result: AuthResult,
        location: &Location,
    ) -> Result<Option<String>, TaskdeckError> {
        if self.state != AuthState::Authenticating {
            return Err(TaskdeckError::invalid_transition(self.state.as_str(), "completed"));
        }
        let (next, target) = match result {
            AuthResult::SignedIn(user) => {
                info!(user = %user.email_address, "signed in");
                (AuthState::Authenticated(user), Some(resolve_navigation(location, true)))
            }
            AuthResult::SignedOut => (
                AuthState::Unauthenticated,
                Some(resolve_navigation(location, false)),
            ),
            AuthResult::Failed(reason) => {
                warn!(%reason, "authentication failed");
                (AuthState::AuthFailed(reason), None)
            }
        };
        self.state = next;
        Ok(target)
    }

    /// Runs a full round trip against `provider`.
    pub fn authenticate(
        &mut self,
        provider: &dyn IdentityProvider,
        location: &Location,
    ) -> Result<Option<String>, TaskdeckError> {
        self.begin()?;
        self.complete(provider.authenticate(), location)
    }

    /// Authenticated → Unauthenticated.
    pub fn sign_out(&mut self, location: &Location) -> Result<String, TaskdeckError> {
        if !self.is_authenticated() {
            return Err(TaskdeckError::invalid_transition(
                self.state.as_str(),
                AuthState::Unauthenticated.as_str(),
            ));
        }
        self.state = AuthState::Unauthenticated;
        Ok(resolve_navigation(location, false))
    }
}
