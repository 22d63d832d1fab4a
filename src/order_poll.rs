//! Periodic refresh of tracker statuses from `/api/user_orders`.

use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::auth::Role;
use crate::context::DeskContext;
use crate::error::DeskResult;
use crate::models::OrderStatus;

#[derive(Clone)]
pub struct OrderPoller {
    ctx: DeskContext,
}

impl OrderPoller {
    pub fn new(ctx: DeskContext) -> Self {
        Self { ctx }
    }

    /// Fetch the tracker snapshot and adopt it for every known order that is
    /// not busy. Returns how many orders changed.
    pub async fn refresh(&self) -> DeskResult<usize> {
        let snapshot = match self.ctx.call(self.ctx.api.user_orders()).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Failed to fetch orders");
                return Err(e);
            }
        };

        let changed = self.ctx.state.write(|s| {
            let mut changed = 0;
            for entry in &snapshot {
                let Ok(status) = OrderStatus::from_str(&entry.tracker) else {
                    debug!(order_id = entry.id, tracker = %entry.tracker, "unknown tracker status ignored");
                    continue;
                };
                if s.apply_tracker(entry.id, status) {
                    changed += 1;
                }
            }
            s.last_order_poll = Some(chrono::Utc::now());
            changed
        });

        if changed > 0 {
            debug!(changed, "order statuses refreshed");
        }
        self.ctx.render_dashboard();
        Ok(changed)
    }

    /// Refresh once the ready-transition delay has passed.
    pub fn schedule_refresh(&self) {
        let this = self.clone();
        let delay = self.ctx.config.ready_refresh_delay();
        self.ctx.spawn_after(delay, "order_refresh", async move {
            let _ = this.refresh().await;
        });
    }

    /// Poll until shutdown. Anonymous sessions have no orders to track.
    pub async fn run(self) {
        if self.ctx.state.read(|s| s.session().role) == Role::Anonymous {
            info!("order polling disabled for anonymous session");
            return;
        }
        info!(
            interval_secs = self.ctx.config.order_poll_secs,
            "order poller started"
        );
        let period = self.ctx.config.order_poll_interval();
        loop {
            tokio::select! {
                _ = self.ctx.shutdown.cancelled() => {
                    info!("order poller stopped");
                    break;
                }
                _ = tokio::time::sleep(period) => {
                    let _ = self.refresh().await;
                }
            }
        }
    }
}
