use crate::domain::order::SettlementToken;
use crate::domain::ports::AuthGateBox;
use crate::domain::session::Session;
use crate::error::Result;
use tracing::{info, warn};

/// Process-wide session state.
///
/// Lifecycle: `init` at app start (optionally restoring a persisted token),
/// `login`/`register` to authenticate, `logout` to tear down. The current
/// session is always read through the auth gate, never cached here, so a
/// login that happened elsewhere is seen on the next `current` call.
pub struct SessionState {
    auth: AuthGateBox,
}

impl SessionState {
    /// Creates the session state, restoring `persisted` when it is still valid.
    pub async fn init(auth: AuthGateBox, persisted: Option<SettlementToken>) -> Result<Self> {
        if let Some(token) = persisted {
            match auth.resume(&token).await? {
                Some(session) => info!(user_id = %session.user.id, "Restored session"),
                None => warn!("Persisted session token was rejected"),
            }
        }
        Ok(Self { auth })
    }

    pub async fn current(&self) -> Result<Option<Session>> {
        self.auth.current_session().await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.login(email, password).await?;
        info!(user_id = %session.user.id, "Logged in");
        Ok(session)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.register(name, email, password).await?;
        info!(user_id = %session.user.id, "Registered");
        Ok(session)
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        info!("Logged out");
        Ok(())
    }
}
