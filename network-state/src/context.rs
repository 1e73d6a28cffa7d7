//! Explicit lifecycle for the network-state handler
//!
//! The entry point owns one `NetworkHandler`, initializes it once, and shuts
//! it down when done. There is no process-wide instance.

use std::sync::Arc;

use network_service::NetworkServiceClient;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::HandlerConfig;
use crate::error::{HandlerError, Result};
use crate::handler::NetworkStateHandler;
use crate::iter::ChangeIterator;
use crate::logging::{self, LoggingMode};

/// Owner of a [`NetworkStateHandler`] with explicit initialize/shutdown
///
/// # Example
///
/// ```rust
/// use network_service::{FakeNetworkService, TaskQueue};
/// use network_state::{HandlerConfig, NetworkHandler, NetworkTypePattern};
/// use std::sync::Arc;
///
/// let queue = TaskQueue::new();
/// let service = FakeNetworkService::with_default_environment(queue.clone());
/// queue.run_until_idle();
///
/// let context = NetworkHandler::new(Arc::new(service), HandlerConfig::default());
/// context.initialize()?;
/// queue.run_until_idle();
///
/// let handler = context.network_state_handler()?;
/// assert_eq!(handler.get_network_list(NetworkTypePattern::DEFAULT).len(), 4);
///
/// context.shutdown()?;
/// # Ok::<(), network_state::HandlerError>(())
/// ```
pub struct NetworkHandler {
    client: Arc<dyn NetworkServiceClient>,
    config: HandlerConfig,
    handler: Mutex<Option<Arc<NetworkStateHandler>>>,
}

impl NetworkHandler {
    pub fn new(client: Arc<dyn NetworkServiceClient>, config: HandlerConfig) -> Self {
        Self {
            client,
            config,
            handler: Mutex::new(None),
        }
    }

    /// Validate the configuration, install logging, and start the handler
    ///
    /// An already installed tracing subscriber is left in place.
    pub fn initialize(&self) -> Result<Arc<NetworkStateHandler>> {
        let mut slot = self.handler.lock();
        if slot.is_some() {
            return Err(HandlerError::AlreadyInitialized);
        }
        self.config.validate()?;

        if self.config.log_mode != LoggingMode::Silent {
            if logging::is_initialized() {
                debug!("tracing subscriber already installed");
            } else {
                logging::init_logging(self.config.log_mode)?;
            }
        }

        let handler = NetworkStateHandler::new(Arc::clone(&self.client), self.config.clone());
        handler.init_property_handler();
        info!("network handler initialized");

        *slot = Some(Arc::clone(&handler));
        Ok(handler)
    }

    /// Shut the handler down; it can be initialized again afterwards
    pub fn shutdown(&self) -> Result<()> {
        let handler = self.handler.lock().take().ok_or(HandlerError::NotInitialized)?;
        handler.shutdown();
        info!("network handler shut down");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.handler.lock().is_some()
    }

    pub fn network_state_handler(&self) -> Result<Arc<NetworkStateHandler>> {
        self.handler.lock().clone().ok_or(HandlerError::NotInitialized)
    }

    /// Blocking iterator over changes of the running handler
    #[track_caller]
    pub fn changes(&self) -> Result<ChangeIterator> {
        let handler = self.network_state_handler()?;
        Ok(handler.changes())
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }
}

impl Drop for NetworkHandler {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.get_mut().take() {
            handler.shutdown();
        }
    }
}
