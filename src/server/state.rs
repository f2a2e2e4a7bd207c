use std::sync::Arc;
use std::time::Instant;

use crate::config::Settings;
use crate::error::Result;
use crate::notification::{
    create_dispatcher, create_dispatcher_with_transport, DeliveryDispatcher, PushTransport,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<DeliveryDispatcher>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let dispatcher = Arc::new(create_dispatcher(&settings)?);

        Ok(Self {
            settings: Arc::new(settings),
            dispatcher,
            start_time: Instant::now(),
        })
    }

    /// Build state around a custom transport instead of the HTTP client.
    pub fn with_transport(settings: Settings, transport: Arc<dyn PushTransport>) -> Self {
        let dispatcher = Arc::new(create_dispatcher_with_transport(&settings, transport));

        Self {
            settings: Arc::new(settings),
            dispatcher,
            start_time: Instant::now(),
        }
    }
}
