use std::sync::Arc;

use crate::auth::JwtValidator;
use crate::config::Settings;
use crate::hub::NotificationHub;
use crate::notification::ComplaintNotifier;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub jwt_validator: Arc<JwtValidator>,
    pub hub: Arc<NotificationHub>,
    pub complaints: ComplaintNotifier,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        let jwt_validator = Arc::new(JwtValidator::new(&settings.jwt));
        let hub = Arc::new(NotificationHub::with_send_timeout(
            settings.sse.send_timeout(),
        ));
        let complaints = ComplaintNotifier::new(hub.clone());

        Self {
            settings: Arc::new(settings),
            jwt_validator,
            hub,
            complaints,
        }
    }
}
