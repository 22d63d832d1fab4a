//! Customer notification bell and desktop notices.
//!
//! Polls `/api/check_notifications` for customer sessions, projects the
//! unread set into the bell, and raises one desktop notice per
//! `order-{kind}-{order_id}` tag.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::DeskContext;
use crate::error::DeskResult;
use crate::events::UiEvent;
use crate::models::{Notification, NotificationKind};
use crate::state::DeskState;

const BADGE_CAP: usize = 9;
const EMPTY_MESSAGE: &str = "No new notifications";

/// Host permission for native notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    Granted,
    /// Not decided yet; asking is still possible.
    #[default]
    Default,
    Denied,
    /// The host has no native notifications at all.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BellItem {
    pub id: i64,
    pub order_id: i64,
    pub message: String,
    pub created_at: String,
    pub kind: NotificationKind,
    pub icon: &'static str,
    pub accent: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BellView {
    /// Badge text; `None` hides the badge.
    pub badge: Option<String>,
    pub pulse: bool,
    pub open: bool,
    pub items: Vec<BellItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<&'static str>,
}

/// Badge text for `count` unread notifications.
pub fn badge_text(count: usize) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_CAP => Some(format!("{BADGE_CAP}+")),
        n => Some(n.to_string()),
    }
}

pub fn project_bell(state: &DeskState) -> BellView {
    let items: Vec<BellItem> = state
        .notifications()
        .iter()
        .map(|n| {
            let kind = n.kind();
            BellItem {
                id: n.id,
                order_id: n.order_id,
                message: n.message.clone(),
                created_at: n.created_at.clone(),
                kind,
                icon: kind.icon(),
                accent: kind.accent(),
            }
        })
        .collect();
    BellView {
        badge: badge_text(items.len()),
        pulse: !items.is_empty(),
        open: state.bell_open,
        empty_message: items.is_empty().then_some(EMPTY_MESSAGE),
        items,
    }
}

/// Native notification request handed to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesktopNotice {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// Hosts collapse notices sharing a tag.
    pub tag: String,
    /// Sticky until the user dismisses it.
    pub require_interaction: bool,
}

pub fn desktop_notice(
    notification: &Notification,
    business_name: &str,
    icon: &str,
) -> Option<DesktopNotice> {
    let kind = notification.desktop_kind()?;
    Some(DesktopNotice {
        title: format!("{business_name} - {}", kind.title_suffix()),
        body: notification.message.clone(),
        icon: icon.to_string(),
        tag: format!("order-{}-{}", kind.slug(), notification.order_id),
        require_interaction: kind == NotificationKind::Rejected,
    })
}

#[derive(Clone)]
pub struct NotificationPoller {
    ctx: DeskContext,
}

impl NotificationPoller {
    pub fn new(ctx: DeskContext) -> Self {
        Self { ctx }
    }

    pub fn is_enabled(&self) -> bool {
        self.ctx
            .state
            .read(|s| s.session().role.receives_notifications())
    }

    fn render(&self) {
        let view = self.ctx.state.read(project_bell);
        self.ctx.emit(UiEvent::Bell(view));
    }

    /// Fetch the unread set, re-render the bell and raise desktop notices.
    /// A no-op for sessions that do not receive notifications.
    pub async fn check(&self) -> DeskResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let snapshot = match self.ctx.call(self.ctx.api.check_notifications()).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Error checking notifications");
                return Err(e);
            }
        };
        debug!(count = snapshot.len(), "notifications polled");
        self.ctx.state.write(|s| s.replace_notifications(snapshot));
        self.render();
        self.deliver_desktop_notices();
        Ok(())
    }

    /// Raise a desktop notice for every active notification not raised yet.
    /// Nothing is raised or remembered until permission is granted; while it
    /// is undecided the host is asked once.
    fn deliver_desktop_notices(&self) {
        let business = self.ctx.config.business_name.as_str();
        let icon = self.ctx.config.notification_icon.as_str();

        let (notices, ask_permission) = self.ctx.state.write(|s| {
            let active: Vec<DesktopNotice> = s
                .notifications
                .iter()
                .filter_map(|n| desktop_notice(n, business, icon))
                .collect();
            // Tags only need remembering while their notification is listed.
            s.delivered_tags
                .retain(|tag| active.iter().any(|notice| &notice.tag == tag));

            match s.permission {
                NotificationPermission::Granted => {
                    let delivered = &mut s.delivered_tags;
                    let fresh: Vec<DesktopNotice> = active
                        .into_iter()
                        .filter(|notice| delivered.insert(notice.tag.clone()))
                        .collect();
                    (fresh, false)
                }
                NotificationPermission::Default if !s.permission_requested => {
                    s.permission_requested = true;
                    (Vec::new(), true)
                }
                _ => (Vec::new(), false),
            }
        });

        if ask_permission {
            self.ctx.emit(UiEvent::NotificationPermissionRequest);
        }
        for notice in notices {
            info!(tag = %notice.tag, "desktop notice raised");
            self.ctx.emit(UiEvent::DesktopNotice(notice));
        }
    }

    /// Mark one notification read. Repeated calls for the same id are
    /// no-ops and send nothing.
    pub async fn mark_read(&self, notification_id: i64) {
        let newly_read = self
            .ctx
            .state
            .write(|s| s.mark_notification_read(notification_id));
        if !newly_read {
            return;
        }
        self.render();
        if let Err(e) = self
            .ctx
            .call(self.ctx.api.mark_notification_read(notification_id))
            .await
        {
            warn!(notification_id, error = %e, "Error marking notification as read");
        }
    }

    /// Click on an item: mark it read, then re-poll.
    pub async fn dismiss(&self, notification_id: i64) {
        self.mark_read(notification_id).await;
        let _ = self.check().await;
    }

    /// Mark every listed notification read, then re-poll.
    pub async fn clear_all(&self) {
        let ids: Vec<i64> = self
            .ctx
            .state
            .read(|s| s.notifications().iter().map(|n| n.id).collect());
        for id in ids {
            self.mark_read(id).await;
        }
        let _ = self.check().await;
    }

    /// Toggle the dropdown. Opening it marks everything listed at that
    /// moment read after the configured delay (fire-and-forget).
    pub fn toggle_bell(&self) -> bool {
        let opened = self.ctx.state.write(|s| {
            s.bell_open = !s.bell_open;
            s.bell_open
        });
        self.render();
        if opened {
            let this = self.clone();
            let delay = self.ctx.config.mark_read_delay();
            self.ctx.spawn_after(delay, "mark_all_read", async move {
                let ids: Vec<i64> = this
                    .ctx
                    .state
                    .read(|s| s.notifications().iter().map(|n| n.id).collect());
                for id in ids {
                    this.mark_read(id).await;
                }
            });
        }
        opened
    }

    pub fn close_bell(&self) {
        let was_open = self.ctx.state.write(|s| std::mem::replace(&mut s.bell_open, false));
        if was_open {
            self.render();
        }
    }

    /// Record the host's answer. Granting raises notices for everything
    /// currently listed.
    pub fn set_permission(&self, permission: NotificationPermission) {
        self.ctx.state.write(|s| s.set_permission(permission));
        debug!(?permission, "notification permission set");
        if permission == NotificationPermission::Granted {
            self.deliver_desktop_notices();
        }
    }

    /// Schedule a check after the configured follow-up delay (e.g. after an
    /// order is served).
    pub fn schedule_check(&self) {
        let this = self.clone();
        let delay = self.ctx.config.notification_followup();
        self.ctx.spawn_after(delay, "notification_check", async move {
            let _ = this.check().await;
        });
    }

    /// Poll until shutdown. The first check runs immediately.
    pub async fn run(self) {
        if !self.is_enabled() {
            info!("notification polling disabled for this session");
            return;
        }
        let mut interval = tokio::time::interval(self.ctx.config.notification_poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(
            interval_secs = self.ctx.config.notification_poll_secs,
            "notification poller started"
        );
        loop {
            tokio::select! {
                _ = self.ctx.shutdown.cancelled() => {
                    info!("notification poller stopped");
                    break;
                }
                _ = interval.tick() => {
                    let _ = self.check().await;
                }
            }
        }
    }
}
