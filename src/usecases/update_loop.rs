//! Long-polling loop: fetch updates, hand each one to the input port, advance the offset.
//!
//! Handler failures are logged and skipped so one bad update never stalls the loop.

use crate::domain::DomainError;
use crate::ports::{InputPort, UpdateSource};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Pause after a failed poll that did not come with a server-given delay.
const ERROR_BACKOFF: Duration = Duration::from_secs(3);

pub struct UpdateLoop {
    source: Arc<dyn UpdateSource>,
    input: Arc<dyn InputPort>,
    poll_timeout_secs: u64,
}

impl UpdateLoop {
    pub fn new(source: Arc<dyn UpdateSource>, input: Arc<dyn InputPort>, poll_timeout_secs: u64) -> Self {
        Self {
            source,
            input,
            poll_timeout_secs,
        }
    }

    /// Poll once and dispatch. Returns the next offset.
    pub async fn tick(&self, offset: i64) -> Result<i64, DomainError> {
        let updates = self
            .source
            .poll_updates(offset, self.poll_timeout_secs)
            .await?;
        let mut next = offset;
        for update in updates {
            next = next.max(update.update_id + 1);
            let Some(incoming) = update.incoming else {
                continue;
            };
            if let Err(e) = self.input.handle(incoming).await {
                error!(update_id = update.update_id, error = %e, "update handling failed");
            }
        }
        Ok(next)
    }

    /// Run until `shutdown` resolves. An in-flight poll is abandoned on shutdown.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset = 0;
        info!(timeout = self.poll_timeout_secs, "polling for updates");
        loop {
            let pause = tokio::select! {
                _ = &mut shutdown => break,
                result = self.tick(offset) => match result {
                    Ok(next) => {
                        offset = next;
                        None
                    }
                    Err(DomainError::FloodWait { seconds }) => {
                        warn!(seconds, "FloodWait while polling");
                        Some(Duration::from_secs(seconds))
                    }
                    Err(e) => {
                        warn!(error = %e, "poll failed, retrying");
                        Some(ERROR_BACKOFF)
                    }
                },
            };
            if let Some(pause) = pause {
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(pause) => {}
                }
            }
        }
        info!("update loop stopped");
    }
}
