//! Order Desk: order-status synchronization client for a restaurant
//! ordering dashboard.
//!
//! [`OrderDesk`] owns the authoritative client state and wires the
//! components together: status transitions, table projection, the customer
//! notification bell, stock annotation, menu availability and stock forms.
//! Every visible change is emitted as a [`events::UiEvent`] through an
//! [`events::EventSink`].

use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod inventory;
pub mod menu;
pub mod models;
pub mod notifications;
pub mod order_poll;
pub mod state;
pub mod status_sync;
pub mod stock;
pub mod tables;
pub mod tracker;

#[cfg(test)]
mod testing;

use api::{HttpOrderApi, OrderApi};
use auth::{PageSignals, Session};
use config::{DeskConfig, LogConfig};
use context::DeskContext;
use error::DeskResult;
use events::{EventSink, UiEvent};
use inventory::{Inventory, StockForm};
use menu::MenuAvailability;
use models::{Availability, Order, TrackerStage};
use notifications::{NotificationPermission, NotificationPoller};
use order_poll::OrderPoller;
use state::{DeskState, StateHandle};
use status_sync::{Confirmer, StatusSync};
use stock::StockAnnotator;

// ============================================================================
// Logging
// ============================================================================

/// Initialise structured logging: console plus a daily rolling file.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for as long as the process should log.
pub fn init_logging(config: &LogConfig) -> DeskResult<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let log_dir = config
        .dir
        .clone()
        .unwrap_or_else(diagnostics::default_log_dir);
    std::fs::create_dir_all(&log_dir)?;
    let pruned = diagnostics::prune_old_logs(&log_dir, config.max_files);

    let file_appender = tracing_appender::rolling::daily(&log_dir, diagnostics::LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| error::DeskError::Config(format!("logging already initialised: {e}")))?;

    info!(dir = %log_dir.display(), pruned, "logging initialised");
    Ok(guard)
}

// ============================================================================
// Client facade
// ============================================================================

/// One dashboard session.
#[derive(Clone)]
pub struct OrderDesk {
    ctx: DeskContext,
    status: StatusSync,
    notifications: NotificationPoller,
    orders: OrderPoller,
    stock: StockAnnotator,
    menu: MenuAvailability,
    inventory: Inventory,
}

impl OrderDesk {
    /// Build a session over any transport. The role comes from the config
    /// when set, otherwise from `signals`.
    pub fn new(
        api: Arc<dyn OrderApi>,
        sink: Arc<dyn EventSink>,
        config: DeskConfig,
        signals: Option<&PageSignals>,
    ) -> Self {
        let session = Session::resolve(config.role, signals);
        info!(role = ?session.role, explicit = session.explicit, "session resolved");
        let state = StateHandle::new(DeskState::new(session));
        let ctx = DeskContext::new(api, state, sink, config);
        Self {
            status: StatusSync::new(ctx.clone()),
            notifications: NotificationPoller::new(ctx.clone()),
            orders: OrderPoller::new(ctx.clone()),
            stock: StockAnnotator::new(ctx.clone()),
            menu: MenuAvailability::new(ctx.clone()),
            inventory: Inventory::new(ctx.clone()),
            ctx,
        }
    }

    /// Build a session talking HTTP to `config.base_url`.
    pub fn connect(
        config: DeskConfig,
        sink: Arc<dyn EventSink>,
        signals: Option<&PageSignals>,
    ) -> DeskResult<Self> {
        let api = HttpOrderApi::new(&config)?;
        info!(base_url = api.base_url(), "connecting");
        Ok(Self::new(Arc::new(api), sink, config, signals))
    }

    pub fn context(&self) -> &DeskContext {
        &self.ctx
    }

    pub fn session(&self) -> Session {
        self.ctx.state.read(|s| s.session())
    }

    /// Seed the order collection from the page's initial render.
    pub fn load_orders(&self, orders: Vec<Order>) {
        let count = orders.len();
        self.ctx.state.write(|s| s.load_orders(orders));
        info!(count, "orders loaded");
        self.ctx.render_dashboard();
    }

    pub fn load_menu(&self, items: impl IntoIterator<Item = (String, Availability)>) {
        self.ctx.state.write(|s| s.load_menu(items));
        let view = self.ctx.state.read(menu::project);
        self.ctx.emit(UiEvent::MenuAvailability(view));
    }

    /// Seed food stock from the page's inventory render. Stock cells and the
    /// inventory table pick it up immediately.
    pub fn load_food_stock(&self, stock: HashMap<String, i64>) {
        self.ctx.state.write(|s| s.set_food_stock(stock));
        self.ctx.render_dashboard();
        self.render_inventory();
    }

    /// Seed ingredient stock from the page's inventory render.
    pub fn load_ingredients(&self, items: impl IntoIterator<Item = (String, i64)>) {
        self.ctx.state.write(|s| s.load_ingredients(items));
        self.render_inventory();
    }

    fn render_inventory(&self) {
        let view = self.ctx.state.read(inventory::project);
        self.ctx.emit(UiEvent::Inventory(view));
    }

    pub fn set_notification_permission(&self, permission: NotificationPermission) {
        self.notifications.set_permission(permission);
    }

    // -- Order transitions ----------------------------------------------------

    pub async fn approve(&self, order_id: i64) -> DeskResult<String> {
        self.status.approve(order_id).await
    }

    pub async fn reject(
        &self,
        order_id: i64,
        confirmer: &dyn Confirmer,
    ) -> DeskResult<Option<String>> {
        self.status.reject(order_id, confirmer).await
    }

    pub async fn advance(&self, order_id: i64, stage: TrackerStage) -> DeskResult<String> {
        self.status.advance(order_id, stage).await
    }

    pub async fn serve(&self, order_id: i64) -> DeskResult<String> {
        self.status.serve(order_id).await
    }

    // -- Polling & notifications ----------------------------------------------

    pub async fn refresh_orders(&self) -> DeskResult<usize> {
        self.orders.refresh().await
    }

    pub async fn refresh_stock(&self) -> DeskResult<()> {
        self.stock.refresh().await
    }

    pub async fn check_notifications(&self) -> DeskResult<()> {
        self.notifications.check().await
    }

    pub fn toggle_bell(&self) -> bool {
        self.notifications.toggle_bell()
    }

    pub fn close_bell(&self) {
        self.notifications.close_bell()
    }

    pub async fn mark_notification_read(&self, notification_id: i64) {
        self.notifications.mark_read(notification_id).await
    }

    pub async fn dismiss_notification(&self, notification_id: i64) {
        self.notifications.dismiss(notification_id).await
    }

    pub async fn clear_notifications(&self) {
        self.notifications.clear_all().await
    }

    // -- Menu & inventory -----------------------------------------------------

    pub async fn set_availability(&self, food: &str, available: bool) -> DeskResult<String> {
        self.menu.set_availability(food, available).await
    }

    pub async fn submit_stock(&self, form: &StockForm) -> DeskResult<i64> {
        self.inventory.submit(form).await
    }

    // -- Lifecycle ------------------------------------------------------------

    /// Render the initial views and start the background pollers.
    pub fn start(&self) {
        self.ctx.render_dashboard();
        let role = self.session().role;

        if role.can_manage_inventory() {
            let stock = self.stock.clone();
            self.ctx.tasks.spawn(async move {
                let _ = stock.refresh().await;
            });
        }
        self.ctx.tasks.spawn(self.orders.clone().run());
        self.ctx.tasks.spawn(self.notifications.clone().run());
        info!(role = ?role, "order desk started");
    }

    /// Cancel pollers and pending delayed work, then wait for them to finish.
    pub async fn shutdown(&self) {
        self.ctx.shutdown.cancel();
        self.ctx.tasks.close();
        self.ctx.tasks.wait().await;
        info!("order desk stopped");
    }
}
