//! In-memory `OrderApi` used by unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::OrderApi;
use crate::auth::{Role, Session};
use crate::config::DeskConfig;
use crate::context::DeskContext;
use crate::error::{DeskError, DeskResult};
use crate::events::RecordingSink;
use crate::models::{
    ActionResponse, ApproveResponse, Availability, AvailabilityResponse, Notification, Order,
    ServeResponse, StockTarget, TrackerSnapshot, TrackerStage,
};
use crate::state::{DeskState, StateHandle};

/// Scripted failure, converted into a fresh `DeskError` per call.
#[derive(Debug, Clone)]
pub enum Fail {
    Network,
    Http(u16, Option<String>),
    Rejected(Option<String>, Option<String>),
    Malformed,
}

impl Fail {
    fn to_error(&self) -> DeskError {
        match self {
            Fail::Network => DeskError::Network("connection refused".into()),
            Fail::Http(status, message) => DeskError::Http {
                status: *status,
                message: message.clone(),
            },
            Fail::Rejected(message, details) => DeskError::Rejected {
                message: message.clone(),
                details: details.clone(),
            },
            Fail::Malformed => DeskError::InvalidResponse("expected value".into()),
        }
    }
}

type Scripted<T> = Mutex<Result<T, Fail>>;

fn answer<T: Clone>(slot: &Scripted<T>) -> DeskResult<T> {
    match &*slot.lock().unwrap() {
        Ok(v) => Ok(v.clone()),
        Err(f) => Err(f.to_error()),
    }
}

pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    pub delay: Mutex<Option<Duration>>,
    pub availability: Scripted<AvailabilityResponse>,
    pub stock_update: Mutex<Option<Fail>>,
    pub food_stock: Scripted<HashMap<String, i64>>,
    pub notifications: Scripted<Vec<Notification>>,
    pub user_orders: Scripted<Vec<TrackerSnapshot>>,
    pub status: Scripted<ActionResponse>,
    pub approve: Scripted<ApproveResponse>,
    pub reject: Scripted<ActionResponse>,
    pub serve: Scripted<ServeResponse>,
}

impl Default for FakeApi {
    fn default() -> Self {
        let ok = ActionResponse {
            success: true,
            message: Some("OK".into()),
        };
        Self {
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            availability: Mutex::new(Ok(AvailabilityResponse {
                message: Some("Status updated".into()),
                error: None,
            })),
            stock_update: Mutex::new(None),
            food_stock: Mutex::new(Ok(HashMap::new())),
            notifications: Mutex::new(Ok(Vec::new())),
            user_orders: Mutex::new(Ok(Vec::new())),
            status: Mutex::new(Ok(ok.clone())),
            approve: Mutex::new(Ok(ApproveResponse {
                success: true,
                message: Some("Order approved".into()),
                stock_update: None,
                details: None,
            })),
            reject: Mutex::new(Ok(ActionResponse {
                success: true,
                message: Some("Order rejected successfully!".into()),
            })),
            serve: Mutex::new(Ok(ServeResponse {
                success: true,
                message: None,
                order: None,
            })),
        }
    }
}

impl FakeApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    async fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }
}

#[async_trait]
impl OrderApi for FakeApi {
    async fn update_availability(
        &self,
        food: &str,
        status: Availability,
    ) -> DeskResult<AvailabilityResponse> {
        self.record(format!("POST /update_status {food} {}", status.label()))
            .await;
        answer(&self.availability)
    }

    async fn update_stock(&self, target: &StockTarget, new_stock: i64) -> DeskResult<()> {
        let path = match target {
            StockTarget::Food(_) => "/update_stock",
            StockTarget::Ingredient(_) => "/update_ingredient_stock",
        };
        self.record(format!("POST {path} {} {new_stock}", target.name()))
            .await;
        match &*self.stock_update.lock().unwrap() {
            Some(f) => Err(f.to_error()),
            None => Ok(()),
        }
    }

    async fn food_stock(&self) -> DeskResult<HashMap<String, i64>> {
        self.record("GET /get_food_stock".into()).await;
        answer(&self.food_stock)
    }

    async fn check_notifications(&self) -> DeskResult<Vec<Notification>> {
        self.record("GET /api/check_notifications".into()).await;
        answer(&self.notifications)
    }

    async fn mark_notification_read(&self, notification_id: i64) -> DeskResult<()> {
        self.record(format!("POST /api/mark_notification_read/{notification_id}"))
            .await;
        Ok(())
    }

    async fn user_orders(&self) -> DeskResult<Vec<TrackerSnapshot>> {
        self.record("GET /api/user_orders".into()).await;
        answer(&self.user_orders)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        stage: TrackerStage,
    ) -> DeskResult<ActionResponse> {
        self.record(format!("POST /update_order_status/{order_id} {stage}"))
            .await;
        answer(&self.status)
    }

    async fn approve_order(&self, order_id: i64) -> DeskResult<ApproveResponse> {
        self.record(format!("POST /approve_order/{order_id}")).await;
        answer(&self.approve)
    }

    async fn reject_order(&self, order_id: i64) -> DeskResult<ActionResponse> {
        self.record(format!("POST /reject_order/{order_id}")).await;
        answer(&self.reject)
    }

    async fn mark_order_served(&self, order_id: i64) -> DeskResult<ServeResponse> {
        self.record(format!("POST /mark_order_served/{order_id}"))
            .await;
        answer(&self.serve)
    }
}

/// Context wired to a fake API and a recording sink.
pub struct Harness {
    pub api: Arc<FakeApi>,
    pub sink: Arc<RecordingSink>,
    pub ctx: DeskContext,
}

impl Harness {
    pub fn new(role: Role, orders: Vec<Order>) -> Self {
        let api = Arc::new(FakeApi::default());
        let sink = Arc::new(RecordingSink::default());
        let mut state = DeskState::new(Session {
            role,
            explicit: true,
        });
        state.load_orders(orders);
        let ctx = DeskContext::new(
            api.clone(),
            StateHandle::new(state),
            sink.clone(),
            DeskConfig::default(),
        );
        Self { api, sink, ctx }
    }
}
