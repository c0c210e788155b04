mod push;

pub use push::{
    InMemoryPushSender, IPushSender, LoggingPushSender, PushGatewayApi, PushNotification,
    PushReport,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Services {
    pub push: Arc<dyn IPushSender>,
}

impl Services {
    pub fn create(push_gateway_url: Option<&str>) -> Self {
        let push: Arc<dyn IPushSender> = match push_gateway_url {
            Some(url) => Arc::new(PushGatewayApi::new(url.to_string())),
            None => Arc::new(LoggingPushSender),
        };
        Self { push }
    }

    pub fn create_inmemory() -> Self {
        Self {
            push: Arc::new(InMemoryPushSender::new()),
        }
    }
}
