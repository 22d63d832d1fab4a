//! Domain and wire types for orders, notifications and stock.
//!
//! Field names follow the server's JSON (`cust_name`, `order_date`, ...) so
//! response bodies deserialize directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Order lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle status of an order.
///
/// `Pending → Approved → Preparing → Cooking → Ready → Served`, or
/// `Pending → Rejected` (terminal, the order is deleted server-side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Approved,
    Preparing,
    Cooking,
    Ready,
    Served,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Approved => "Approved",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Cooking => "Cooking",
            OrderStatus::Ready => "Ready",
            OrderStatus::Served => "Served",
            OrderStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "approved" => Ok(OrderStatus::Approved),
            "preparing" => Ok(OrderStatus::Preparing),
            "cooking" => Ok(OrderStatus::Cooking),
            "ready" => Ok(OrderStatus::Ready),
            "served" => Ok(OrderStatus::Served),
            "rejected" => Ok(OrderStatus::Rejected),
            other => Err(format!("Unknown order status: {other}")),
        }
    }
}

/// The three kitchen stages a staff member can advance an order to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackerStage {
    Preparing,
    Cooking,
    Ready,
}

impl TrackerStage {
    pub const ALL: [TrackerStage; 3] = [
        TrackerStage::Preparing,
        TrackerStage::Cooking,
        TrackerStage::Ready,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TrackerStage::Preparing => "Preparing",
            TrackerStage::Cooking => "Cooking",
            TrackerStage::Ready => "Ready to Pick Up",
        }
    }
}

impl From<TrackerStage> for OrderStatus {
    fn from(stage: TrackerStage) -> Self {
        match stage {
            TrackerStage::Preparing => OrderStatus::Preparing,
            TrackerStage::Cooking => OrderStatus::Cooking,
            TrackerStage::Ready => OrderStatus::Ready,
        }
    }
}

impl fmt::Display for TrackerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(OrderStatus::from(*self).as_str())
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// Client-side projection of a server order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    #[serde(default)]
    pub order_date: String,
    #[serde(default)]
    pub cust_name: String,
    #[serde(default)]
    pub cust_contact: String,
    #[serde(default)]
    pub food: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default = "default_status", alias = "tracker")]
    pub status: OrderStatus,
    #[serde(default, alias = "receipt_image")]
    pub receipt: Option<String>,
    #[serde(default)]
    pub served_date: Option<String>,
}

fn default_status() -> OrderStatus {
    OrderStatus::Pending
}

/// Order shape returned by `/mark_order_served/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServedOrder {
    pub id: i64,
    #[serde(default)]
    pub order_date: String,
    #[serde(default)]
    pub cust_name: String,
    #[serde(default)]
    pub cust_contact: String,
    #[serde(default)]
    pub food: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub served_date: Option<String>,
}

impl ServedOrder {
    /// Fold the served payload into an order, creating one when the client
    /// never had it.
    pub fn into_order(self, existing: Option<&Order>) -> Order {
        Order {
            id: self.id,
            order_date: self.order_date,
            cust_name: self.cust_name,
            cust_contact: self.cust_contact,
            food: self.food,
            quantity: self.quantity,
            price: self.price,
            payment_status: self.payment_status,
            status: OrderStatus::Served,
            receipt: existing.and_then(|o| o.receipt.clone()),
            served_date: self.served_date.filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Entry of `/api/user_orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerSnapshot {
    pub id: i64,
    pub tracker: String,
}

// ---------------------------------------------------------------------------
// Mutation responses
// ---------------------------------------------------------------------------

/// `{success, message}` shape shared by status/reject endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StockUpdate {
    pub quantity_deducted: i64,
    pub food_name: String,
    pub new_stock: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApproveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stock_update: Option<StockUpdate>,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub order: Option<ServedOrder>,
}

/// `/update_status` answers with `{message}` on success or `{error}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Ready,
    Rejected,
    Served,
}

impl NotificationKind {
    /// Fallback typing for servers that do not send `kind`.
    pub fn classify(message: &str) -> NotificationKind {
        if message.contains("rejected") {
            NotificationKind::Rejected
        } else if message.contains("served") {
            NotificationKind::Served
        } else {
            NotificationKind::Ready
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            NotificationKind::Ready => "ready",
            NotificationKind::Rejected => "rejected",
            NotificationKind::Served => "served",
        }
    }

    pub fn title_suffix(&self) -> &'static str {
        match self {
            NotificationKind::Ready => "Order Ready",
            NotificationKind::Rejected => "Order Rejected",
            NotificationKind::Served => "Order Served",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Ready => "✅",
            NotificationKind::Rejected => "❌",
            NotificationKind::Served => "🎉",
        }
    }

    pub fn accent(&self) -> &'static str {
        match self {
            NotificationKind::Ready => "#4CAF50",
            NotificationKind::Rejected => "#f44336",
            NotificationKind::Served => "#2196F3",
        }
    }
}

/// An unread notification as delivered by `/api/check_notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub order_id: i64,
    pub message: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub kind: Option<NotificationKind>,
}

impl Notification {
    /// Kind used for bell styling: explicit when sent, classified otherwise.
    pub fn kind(&self) -> NotificationKind {
        self.kind
            .unwrap_or_else(|| NotificationKind::classify(&self.message))
    }

    /// Kind used for desktop delivery. Untyped messages only count as
    /// "ready" when they say so; anything else is not announced.
    pub fn desktop_kind(&self) -> Option<NotificationKind> {
        if let Some(kind) = self.kind {
            return Some(kind);
        }
        if self.message.contains("ready for pickup") {
            Some(NotificationKind::Ready)
        } else if self.message.contains("rejected") {
            Some(NotificationKind::Rejected)
        } else if self.message.contains("served") {
            Some(NotificationKind::Served)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Menu / inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "Available")]
    Available,
    #[serde(rename = "Not Available")]
    NotAvailable,
}

impl Availability {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            Availability::Available
        } else {
            Availability::NotAvailable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Availability::Available => "Available",
            Availability::NotAvailable => "Not Available",
        }
    }
}

/// Which stock table a form writes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum StockTarget {
    Food(String),
    Ingredient(String),
}

impl StockTarget {
    pub fn name(&self) -> &str {
        match self {
            StockTarget::Food(n) | StockTarget::Ingredient(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockFormMode {
    #[default]
    Add,
    Replace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_status_parses_tracker_strings() {
        assert_eq!("Cooking".parse::<OrderStatus>(), Ok(OrderStatus::Cooking));
        assert_eq!(" ready ".parse::<OrderStatus>(), Ok(OrderStatus::Ready));
        assert!("Dancing".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_classify_by_message() {
        assert_eq!(
            NotificationKind::classify("Your order #4 was rejected"),
            NotificationKind::Rejected
        );
        assert_eq!(
            NotificationKind::classify("Order #4 has been served. Enjoy!"),
            NotificationKind::Served
        );
        assert_eq!(
            NotificationKind::classify("Order #4 is ready for pickup"),
            NotificationKind::Ready
        );
    }

    #[test]
    fn test_explicit_kind_wins_over_message() {
        let n: Notification = serde_json::from_value(json!({
            "id": 1,
            "order_id": 9,
            "message": "served fresh, but rejected by the kitchen",
            "created_at": "2026-10-19 12:00",
            "kind": "ready"
        }))
        .unwrap();
        assert_eq!(n.kind(), NotificationKind::Ready);
        assert_eq!(n.desktop_kind(), Some(NotificationKind::Ready));
    }

    #[test]
    fn test_untyped_message_without_phrase_is_not_announced() {
        let n = Notification {
            id: 1,
            order_id: 2,
            message: "Thanks for ordering".into(),
            created_at: String::new(),
            kind: None,
        };
        assert_eq!(n.kind(), NotificationKind::Ready);
        assert_eq!(n.desktop_kind(), None);
    }

    #[test]
    fn test_served_order_keeps_receipt_and_drops_blank_date() {
        let existing = Order {
            id: 7,
            order_date: "2026-10-19".into(),
            cust_name: "Ana".into(),
            cust_contact: "0917".into(),
            food: "Adobo".into(),
            quantity: 1,
            price: 120.0,
            payment_status: "Paid".into(),
            status: OrderStatus::Ready,
            receipt: Some("receipts/7.png".into()),
            served_date: None,
        };
        let served: ServedOrder = serde_json::from_value(json!({
            "id": 7,
            "order_date": "2026-10-19",
            "cust_name": "Ana",
            "cust_contact": "0917",
            "food": "Adobo",
            "quantity": 1,
            "price": 120.0,
            "payment_status": "Paid",
            "served_date": "  "
        }))
        .unwrap();
        let order = served.into_order(Some(&existing));
        assert_eq!(order.status, OrderStatus::Served);
        assert_eq!(order.receipt.as_deref(), Some("receipts/7.png"));
        assert!(order.served_date.is_none());
    }

    #[test]
    fn test_availability_wire_labels() {
        assert_eq!(
            serde_json::to_value(Availability::NotAvailable).unwrap(),
            json!("Not Available")
        );
        assert_eq!(Availability::from_checked(true).label(), "Available");
    }
}
