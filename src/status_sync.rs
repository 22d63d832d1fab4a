//! Status synchronizer: staff-initiated order transitions.
//!
//! Each transition takes the per-order in-flight guard, sends one request
//! under the configured timeout, and on success commits the new status to
//! state. A row whose lifecycle table changes keeps its old placement,
//! flagged `removing`, for the removal delay before it moves.

use tracing::{debug, info, warn};

use crate::context::DeskContext;
use crate::error::{DeskError, DeskResult};
use crate::events::Toast;
use crate::models::{ApproveResponse, Order, OrderStatus, TrackerStage};
use crate::notifications::NotificationPoller;
use crate::order_poll::OrderPoller;
use crate::stock::{StockAnnotator, LOW_STOCK_THRESHOLD};
use crate::tables::TableKind;

/// Synchronous yes/no prompt shown before destructive actions.
pub trait Confirmer: Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmer for F
where
    F: Fn(&str) -> bool + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Approve,
    Reject,
    Advance,
    Serve,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Advance => "update",
            Action::Serve => "serve",
        }
    }

    fn network_message(&self) -> &'static str {
        match self {
            Action::Approve => "Network error while approving order",
            Action::Reject => "Network error while rejecting order",
            Action::Advance => "Network error while updating order",
            Action::Serve => "Network error while serving order",
        }
    }

    fn failed_message(&self) -> &'static str {
        match self {
            Action::Approve => "Failed to approve order",
            Action::Reject => "Failed to reject order",
            Action::Advance => "Failed to update status",
            Action::Serve => "Failed to mark order as served",
        }
    }

    /// Toast text for a failed transition: the server's message when it
    /// sent one, otherwise the fixed text for the failure class.
    fn failure_text(&self, err: &DeskError) -> String {
        if let Some(message) = err.server_message() {
            return message.to_string();
        }
        if err.is_transport() {
            self.network_message().to_string()
        } else {
            self.failed_message().to_string()
        }
    }
}

/// Prompt shown before rejecting an order.
pub fn reject_prompt(order: &Order) -> String {
    format!(
        "Are you sure you want to reject and delete this order? This action cannot be undone.\
         \n\nOrder Details:\n• Food: {}\n• Quantity: {}",
        order.food, order.quantity
    )
}

/// Success toast for an approval, extended with the stock deduction.
pub fn approve_message(resp: &ApproveResponse) -> String {
    let mut message = resp
        .message
        .clone()
        .unwrap_or_else(|| "Order approved successfully!".to_string());
    if let Some(update) = &resp.stock_update {
        message.push_str(&format!(
            "\n📦 Stock Update: {} {} deducted. Remaining: {}",
            update.quantity_deducted, update.food_name, update.new_stock
        ));
        if update.new_stock <= LOW_STOCK_THRESHOLD {
            message.push_str(&format!(
                "\n⚠️ LOW STOCK WARNING: {} is running low!",
                update.food_name
            ));
        }
    }
    message
}

#[derive(Clone)]
pub struct StatusSync {
    ctx: DeskContext,
    stock: StockAnnotator,
    notifications: NotificationPoller,
    orders: OrderPoller,
}

impl StatusSync {
    pub fn new(ctx: DeskContext) -> Self {
        Self {
            stock: StockAnnotator::new(ctx.clone()),
            notifications: NotificationPoller::new(ctx.clone()),
            orders: OrderPoller::new(ctx.clone()),
            ctx,
        }
    }

    fn authorize(&self, action: Action) -> DeskResult<()> {
        let role = self.ctx.state.read(|s| s.session().role);
        if role.can_update_orders() {
            return Ok(());
        }
        let message = role.order_action_denied(action.verb());
        info!(role = ?role, action = action.verb(), "order action denied");
        self.ctx.toast(Toast::info(message.clone()));
        Err(DeskError::Forbidden(message))
    }

    /// Apply a confirmed change to an order. When the order changes
    /// lifecycle table, the row keeps its old placement until the removal
    /// delay has elapsed.
    fn commit(&self, order_id: i64, apply: impl FnOnce(&mut Order)) {
        let departing = self.ctx.state.write(|s| {
            let entry = s.order_mut(order_id)?;
            let from = entry.order.status;
            apply(&mut entry.order);
            entry.pending_status = None;
            if TableKind::for_status(from) != TableKind::for_status(entry.order.status) {
                entry.departing_from = Some(from);
                Some(())
            } else {
                None
            }
        });
        self.ctx.render_dashboard();

        if departing.is_some() {
            let ctx = self.ctx.clone();
            let delay = self.ctx.config.removal_delay();
            self.ctx.spawn_after(delay, "row_removal", async move {
                ctx.state.write(|s| {
                    let status = s.order(order_id).map(|e| e.order.status);
                    match status {
                        Some(OrderStatus::Rejected) => {
                            s.remove_order(order_id);
                        }
                        Some(_) => {
                            if let Some(entry) = s.order_mut(order_id) {
                                entry.departing_from = None;
                            }
                        }
                        None => {}
                    }
                });
                debug!(order_id, "row removal settled");
                ctx.render_dashboard();
            });
        }
    }

    fn fail(&self, action: Action, order_id: i64, err: &DeskError, extra: Option<&str>) {
        let mut text = action.failure_text(err);
        if let Some(details) = extra {
            text.push_str(&format!("\nDetails: {details}"));
        }
        warn!(order_id, action = action.verb(), error = %err, "order transition failed");
        self.ctx.toast(Toast::error(text));
    }

    /// Approve a pending order. Returns the success toast text.
    pub async fn approve(&self, order_id: i64) -> DeskResult<String> {
        self.authorize(Action::Approve)?;
        let guard = self.ctx.state.begin_order_request(order_id)?;
        self.ctx.render_dashboard();

        let result = self.ctx.call(self.ctx.api.approve_order(order_id)).await;
        drop(guard);

        match result {
            Ok(resp) => {
                let message = approve_message(&resp);
                if let Some(update) = &resp.stock_update {
                    self.ctx
                        .state
                        .write(|s| s.set_food_stock_of(&update.food_name, update.new_stock));
                    if update.new_stock <= LOW_STOCK_THRESHOLD {
                        warn!(food = %update.food_name, stock = update.new_stock, "stock is running low");
                    }
                }
                self.commit(order_id, |o| o.status = OrderStatus::Approved);
                info!(order_id, "order approved");
                self.ctx.toast(Toast::success(message.clone()));
                self.stock.schedule_refresh();
                Ok(message)
            }
            Err(e) => {
                self.ctx.render_dashboard();
                self.fail(Action::Approve, order_id, &e, e.server_details());
                Err(e)
            }
        }
    }

    /// Reject and delete a pending order after confirmation.
    ///
    /// Returns `Ok(None)` when the user declined; nothing is sent then.
    pub async fn reject(
        &self,
        order_id: i64,
        confirmer: &dyn Confirmer,
    ) -> DeskResult<Option<String>> {
        self.authorize(Action::Reject)?;
        let prompt = self
            .ctx
            .state
            .read(|s| s.order(order_id).map(|e| reject_prompt(&e.order)))
            .ok_or(DeskError::NotFound(order_id))?;
        if !confirmer.confirm(&prompt) {
            debug!(order_id, "reject cancelled");
            return Ok(None);
        }

        let guard = self.ctx.state.begin_order_request(order_id)?;
        self.ctx.render_dashboard();
        let result = self.ctx.call(self.ctx.api.reject_order(order_id)).await;
        drop(guard);

        match result {
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| "Order rejected successfully!".to_string());
                self.commit(order_id, |o| o.status = OrderStatus::Rejected);
                info!(order_id, "order rejected");
                self.ctx.toast(Toast::success(message.clone()));
                Ok(Some(message))
            }
            Err(e) => {
                self.ctx.render_dashboard();
                self.fail(Action::Reject, order_id, &e, None);
                Err(e)
            }
        }
    }

    /// Move an order to a kitchen stage. The target is shown immediately and
    /// reverts if the server does not confirm it.
    pub async fn advance(&self, order_id: i64, stage: TrackerStage) -> DeskResult<String> {
        self.authorize(Action::Advance)?;
        let guard = self.ctx.state.begin_order_request(order_id)?;
        let target = OrderStatus::from(stage);
        self.ctx.state.write(|s| {
            if let Some(entry) = s.order_mut(order_id) {
                entry.pending_status = Some(target);
            }
        });
        self.ctx.render_dashboard();

        let result = self
            .ctx
            .call(self.ctx.api.update_order_status(order_id, stage))
            .await;
        drop(guard);

        match result {
            Ok(_) => {
                self.commit(order_id, |o| o.status = target);
                let message = format!("Order status updated to {stage}");
                info!(order_id, status = %stage, "order status updated");
                self.ctx.toast(Toast::success(message.clone()));
                if stage == TrackerStage::Ready {
                    self.orders.schedule_refresh();
                }
                Ok(message)
            }
            Err(e) => {
                self.ctx.state.write(|s| {
                    if let Some(entry) = s.order_mut(order_id) {
                        entry.pending_status = None;
                    }
                });
                self.ctx.render_dashboard();
                self.fail(Action::Advance, order_id, &e, None);
                Err(e)
            }
        }
    }

    /// Mark a ready order as served.
    pub async fn serve(&self, order_id: i64) -> DeskResult<String> {
        self.authorize(Action::Serve)?;
        let guard = self.ctx.state.begin_order_request(order_id)?;
        self.ctx.render_dashboard();
        let result = self.ctx.call(self.ctx.api.mark_order_served(order_id)).await;
        drop(guard);

        match result {
            Ok(resp) => {
                self.commit(order_id, |o| match resp.order {
                    Some(served) if served.id == o.id => *o = served.into_order(Some(o)),
                    _ => o.status = OrderStatus::Served,
                });
                let message = "Order marked as served!".to_string();
                info!(order_id, "order served");
                self.ctx.toast(Toast::success(message.clone()));
                self.notifications.schedule_check();
                Ok(message)
            }
            Err(e) => {
                self.ctx.render_dashboard();
                self.fail(Action::Serve, order_id, &e, None);
                Err(e)
            }
        }
    }
}
