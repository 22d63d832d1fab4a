//! Outbound UI events.
//!
//! The client never touches a view tree. It emits full projections and
//! transient messages to an `EventSink`, which the embedding shell renders.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::inventory::InventoryView;
use crate::menu::AvailabilityView;
use crate::notifications::{BellView, DesktopNotice};
use crate::tables::DashboardView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// Transient confirmation or error message.
#[derive(Debug, Clone, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastKind::Info, message)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum UiEvent {
    Dashboard(DashboardView),
    Bell(BellView),
    Toast(Toast),
    DesktopNotice(DesktopNotice),
    NotificationPermissionRequest,
    MenuAvailability(AvailabilityView),
    Inventory(InventoryView),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::Dashboard(_) => "dashboard",
            UiEvent::Bell(_) => "bell",
            UiEvent::Toast(_) => "toast",
            UiEvent::DesktopNotice(_) => "desktop_notice",
            UiEvent::NotificationPermissionRequest => "notification_permission_request",
            UiEvent::MenuAvailability(_) => "menu_availability",
            UiEvent::Inventory(_) => "inventory",
        }
    }
}

/// Receiver of UI events. Implementations must not block.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: UiEvent);
}

/// Logs every event; used by the headless binary.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: UiEvent) {
        match &event {
            UiEvent::Toast(toast) => match toast.kind {
                ToastKind::Error => warn!(message = %toast.message, "toast"),
                _ => info!(message = %toast.message, "toast"),
            },
            UiEvent::DesktopNotice(notice) => {
                info!(title = %notice.title, tag = %notice.tag, "desktop notice")
            }
            UiEvent::Bell(bell) => {
                debug!(badge = ?bell.badge, items = bell.items.len(), "bell updated")
            }
            other => debug!(event = other.name(), "ui event"),
        }
    }
}

/// Forwards events to an unbounded channel, e.g. a webview bridge task.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("ui event dropped: receiver closed");
        }
    }
}

/// Keeps every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Toast(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn last_dashboard(&self) -> Option<DashboardView> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::Dashboard(d) => Some(d),
            _ => None,
        })
    }

    pub fn last_bell(&self) -> Option<BellView> {
        self.events().into_iter().rev().find_map(|e| match e {
            UiEvent::Bell(b) => Some(b),
            _ => None,
        })
    }

    pub fn desktop_notices(&self) -> Vec<DesktopNotice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::DesktopNotice(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.events.lock() {
            g.clear();
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        if let Ok(mut g) = self.events.lock() {
            g.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_serializes_with_event_tag() {
        let value = serde_json::to_value(UiEvent::Toast(Toast::error("Failed to update status")))
            .unwrap();
        assert_eq!(value["event"], "toast");
        assert_eq!(value["payload"]["kind"], "error");
        assert_eq!(value["payload"]["message"], "Failed to update status");
    }

    #[tokio::test]
    async fn test_channel_sink_forwards_events() {
        let (sink, mut rx) = ChannelSink::new();
        sink.emit(UiEvent::NotificationPermissionRequest);
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "notification_permission_request");
    }

    #[test]
    fn test_recording_sink_filters_toasts() {
        let sink = RecordingSink::default();
        sink.emit(UiEvent::NotificationPermissionRequest);
        sink.emit(UiEvent::Toast(Toast::success("ok")));
        assert_eq!(sink.toasts().len(), 1);
        sink.clear();
        assert!(sink.events().is_empty());
    }
}
