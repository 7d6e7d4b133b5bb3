use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::db::RecordStore;
use crate::models::BookingEvent;
use crate::services::events;
use crate::services::reservation::ReservationApi;

pub struct AppState {
    pub config: AppConfig,
    pub api: ReservationApi,
    pub events_tx: broadcast::Sender<BookingEvent>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Self {
        let events_tx = events::channel();
        let api = ReservationApi::new(store, &config, events_tx.clone());
        Self {
            config,
            api,
            events_tx,
        }
    }
}
