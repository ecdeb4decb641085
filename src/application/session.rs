use crate::domain::ports::LedgerGatewayRef;
use crate::domain::session::{Credentials, Session};
use crate::error::{DispatchError, Result};

/// Holds the current ledger session, if any, and its lifecycle.
pub struct SessionManager {
    ledger: LedgerGatewayRef,
    session: Option<Session>,
}

impl SessionManager {
    pub fn new(ledger: LedgerGatewayRef) -> Self {
        Self {
            ledger,
            session: None,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn require(&self) -> Result<&Session> {
        self.current().ok_or(DispatchError::NoSession)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Opens a new session, closing the previous one first.
    ///
    /// On failure the manager is left disconnected.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<&Session> {
        self.logout().await;
        let session = self.ledger.login(credentials).await?;
        tracing::info!(
            company = %session.company_db,
            user = %session.user_name,
            "Ledger session established"
        );
        Ok(self.session.insert(session))
    }

    /// Closes the current session. Errors from the ledger are logged and ignored.
    pub async fn logout(&mut self) {
        if let Some(session) = self.session.take()
            && let Err(e) = self.ledger.logout(&session).await
        {
            tracing::warn!(error = %e, "Ledger logout failed");
        }
    }
}
