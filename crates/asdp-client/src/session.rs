//! Session provider: the signed-in user and the session endpoints.
//!
//! The workflow controller receives a [`SessionProvider`] at construction
//! instead of reaching for ambient state. [`HttpSession`] is the
//! implementation backed by the cookie-carrying [`Transport`].

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use asdp_model::{Credentials, User};

use crate::error::{ClientError, Result};
use crate::response::{interpret_login, interpret_profile, interpret_session};
use crate::transport::{ApiRequest, Transport};

/// Current-user state and the operations that change it.
pub trait SessionProvider: Send + Sync {
    /// The user held by the session, if signed in.
    fn current_user(&self) -> Option<User>;

    /// Whether a user is signed in.
    fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Re-read the session from the backend and return the signed-in user.
    ///
    /// Any failure clears the held user.
    fn refresh(&self) -> impl Future<Output = Option<User>> + Send;

    /// Sign in and return the signed-in user.
    fn login(&self, username: &str, password: &str) -> impl Future<Output = Result<User>> + Send;

    /// Sign out.
    fn logout(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Session backed by the `/me`, `/login`, `/logout` and `/profile` endpoints.
#[derive(Debug)]
pub struct HttpSession<T> {
    transport: Arc<T>,
    user: Mutex<Option<User>>,
}

impl<T: Transport> HttpSession<T> {
    /// Creates a signed-out session over a shared transport.
    #[must_use]
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            user: Mutex::new(None),
        }
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// Fetch the signed-in user's full profile.
    pub async fn profile(&self) -> Result<User> {
        let response = self.transport.send(ApiRequest::Profile).await?;
        interpret_profile(&response)
    }
}

impl<T: Transport> SessionProvider for HttpSession<T> {
    fn current_user(&self) -> Option<User> {
        self.user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn refresh(&self) -> Option<User> {
        let user = match self.transport.send(ApiRequest::Me).await {
            Ok(response) => match interpret_session(&response) {
                Ok(status) if status.authenticated => status.user,
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!("Session check failed: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::debug!("Session check failed: {}", e);
                None
            }
        };

        match &user {
            Some(user) => tracing::debug!(username = %user.username, "Session active"),
            None => tracing::debug!("No active session"),
        }
        self.set_user(user.clone());
        user
    }

    async fn login(&self, username: &str, password: &str) -> Result<User> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.transport.send(ApiRequest::Login(credentials)).await?;
        interpret_login(&response)?;

        let user = self.refresh().await.ok_or(ClientError::NotAuthenticated)?;
        tracing::info!(username = %user.username, "Signed in");
        Ok(user)
    }

    async fn logout(&self) -> Result<()> {
        let result = self.transport.send(ApiRequest::Logout).await.map(drop);
        self.refresh().await;
        if result.is_ok() {
            tracing::info!("Signed out");
        }
        result
    }
}
