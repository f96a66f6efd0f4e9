//! Inbound port. The polling loop calls into the application.

use crate::domain::{DomainError, Incoming};

/// Input port: handle one chat update (message or button press).
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    async fn handle(&self, update: Incoming) -> Result<(), DomainError>;
}
