//! Entry point tying configuration, transport, handles and managers together.

use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::error::MnsError;
use crate::manager::{AccountManager, QueueManager, TopicManager};
use crate::qps::QpsMonitor;
use crate::queue::QueueClient;
use crate::topic::TopicClient;
use crate::transport::{HttpTransport, MnsTransport};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Shared client from which queue and topic handles are created
///
/// Each handle gets its own QPS limiter; handles created for the same name
/// do not share one.
#[derive(Clone)]
pub struct MnsClient {
    transport: Arc<dyn MnsTransport>,
    queue_qps_limit: u32,
    topic_qps_limit: u32,
    qps_window_seconds: u64,
}

impl MnsClient {
    /// Build a client over HTTP using the credential source in `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, MnsError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::from_transport(Arc::new(transport), config))
    }

    /// Build a client over HTTP with an explicit credential provider
    pub fn new(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, MnsError> {
        let transport = HttpTransport::new(config, credentials)?;
        Ok(Self::from_transport(Arc::new(transport), config))
    }

    /// Build a client over any transport, taking the limits from `config`
    pub fn from_transport(transport: Arc<dyn MnsTransport>, config: &ClientConfig) -> Self {
        Self {
            transport,
            queue_qps_limit: config.queue_qps_limit,
            topic_qps_limit: config.topic_qps_limit,
            qps_window_seconds: config.qps_window_seconds,
        }
    }

    pub fn transport(&self) -> &Arc<dyn MnsTransport> {
        &self.transport
    }

    pub fn account_id(&self) -> &str {
        self.transport.account_id()
    }

    pub fn region(&self) -> &str {
        self.transport.region()
    }

    fn limiter(&self, override_limit: u32, default_limit: u32) -> Arc<QpsMonitor> {
        let ceiling = if override_limit > 0 {
            override_limit
        } else {
            default_limit
        };
        Arc::new(QpsMonitor::new(self.qps_window_seconds, ceiling))
    }

    /// Handle for a queue using the configured QPS ceiling
    pub fn queue(&self, name: impl Into<String>) -> QueueClient {
        self.queue_with_qps(name, 0)
    }

    /// Handle for a queue with its own QPS ceiling; 0 keeps the configured one
    pub fn queue_with_qps(&self, name: impl Into<String>, qps_limit: u32) -> QueueClient {
        let name = name.into();
        let limiter = self.limiter(qps_limit, self.queue_qps_limit);
        debug!(queue = %name, qps_limit = limiter.ceiling(), "Creating queue handle");
        QueueClient::new(name, self.transport.clone(), limiter)
    }

    pub fn topic(&self, name: impl Into<String>) -> TopicClient {
        self.topic_with_qps(name, 0)
    }

    pub fn topic_with_qps(&self, name: impl Into<String>, qps_limit: u32) -> TopicClient {
        let name = name.into();
        let limiter = self.limiter(qps_limit, self.topic_qps_limit);
        debug!(topic = %name, qps_limit = limiter.ceiling(), "Creating topic handle");
        TopicClient::new(name, self.transport.clone(), limiter)
    }

    pub fn queue_manager(&self) -> QueueManager {
        QueueManager::new(self.transport.clone())
    }

    pub fn topic_manager(&self) -> TopicManager {
        TopicManager::new(self.transport.clone())
    }

    pub fn account_manager(&self) -> AccountManager {
        AccountManager::new(self.transport.clone())
    }
}

impl fmt::Debug for MnsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MnsClient")
            .field("account_id", &self.transport.account_id())
            .field("region", &self.transport.region())
            .field("queue_qps_limit", &self.queue_qps_limit)
            .field("topic_qps_limit", &self.topic_qps_limit)
            .field("qps_window_seconds", &self.qps_window_seconds)
            .finish()
    }
}
