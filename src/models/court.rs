use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Court {
    pub id: i64,
    pub owner_email: String,
    pub name: String,
    pub location: String,
    pub hourly_price: f64,
    pub sport_type: String,
    pub is_available: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCourt {
    pub owner_email: String,
    pub name: String,
    pub location: String,
    pub hourly_price: f64,
    pub sport_type: String,
    pub is_available: bool,
}
