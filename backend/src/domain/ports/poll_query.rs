//! Driving port for poll listings.

use async_trait::async_trait;

use crate::domain::{Error, Poll};

/// Poll reads consumed by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PollQuery: Send + Sync {
    /// Every poll across all households, oldest first.
    async fn list_polls(&self) -> Result<Vec<Poll>, Error>;
}
