//! Authoritative client-side state.
//!
//! Every mutation response and every poll lands here; tables, trackers,
//! the bell and stock cells are projections of this state and nothing
//! else. The lock is never held across an `.await`.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::auth::Session;
use crate::error::{DeskError, DeskResult};
use crate::menu::MenuItem;
use crate::models::{Availability, Notification, Order, OrderStatus, StockTarget};
use crate::notifications::NotificationPermission;

/// One order plus the client-only bookkeeping around it.
#[derive(Debug, Clone)]
pub struct OrderEntry {
    pub order: Order,
    /// Optimistic status shown while an advance request is in flight.
    pub pending_status: Option<OrderStatus>,
    /// Status whose table the row keeps occupying while it animates out.
    pub departing_from: Option<OrderStatus>,
    pub in_flight: bool,
}

impl OrderEntry {
    fn new(order: Order) -> Self {
        Self {
            order,
            pending_status: None,
            departing_from: None,
            in_flight: false,
        }
    }

    /// Status shown in the dropdown and tracker.
    pub fn displayed_status(&self) -> OrderStatus {
        self.pending_status.unwrap_or(self.order.status)
    }

    /// Status that decides which table the row is placed in. Optimistic
    /// statuses never move a row; only committed ones do.
    pub fn placement_status(&self) -> OrderStatus {
        self.departing_from.unwrap_or(self.order.status)
    }

    pub fn is_removing(&self) -> bool {
        self.departing_from.is_some()
    }
}

#[derive(Debug, Default)]
pub struct DeskState {
    pub(crate) session: Session,
    pub(crate) orders: BTreeMap<i64, OrderEntry>,
    /// `None` until the first successful stock fetch.
    pub(crate) food_stock: Option<HashMap<String, i64>>,
    pub(crate) ingredient_stock: BTreeMap<String, i64>,
    pub(crate) menu: BTreeMap<String, MenuItem>,
    pub(crate) notifications: Vec<Notification>,
    pub(crate) read_notifications: HashSet<i64>,
    pub(crate) delivered_tags: HashSet<String>,
    pub(crate) bell_open: bool,
    pub(crate) permission: NotificationPermission,
    pub(crate) permission_requested: bool,
    pub(crate) last_order_poll: Option<DateTime<Utc>>,
    pub(crate) last_notification_poll: Option<DateTime<Utc>>,
}

impl DeskState {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    // -- Orders ---------------------------------------------------------------

    /// Replace the order collection with a full snapshot (initial page load).
    pub fn load_orders(&mut self, orders: Vec<Order>) {
        self.orders = orders
            .into_iter()
            .filter(|o| o.status != OrderStatus::Rejected)
            .map(|o| (o.id, OrderEntry::new(o)))
            .collect();
    }

    pub fn upsert_order(&mut self, order: Order) {
        match self.orders.get_mut(&order.id) {
            Some(entry) => entry.order = order,
            None => {
                self.orders.insert(order.id, OrderEntry::new(order));
            }
        }
    }

    pub fn order(&self, id: i64) -> Option<&OrderEntry> {
        self.orders.get(&id)
    }

    pub(crate) fn order_mut(&mut self, id: i64) -> Option<&mut OrderEntry> {
        self.orders.get_mut(&id)
    }

    pub fn orders(&self) -> impl Iterator<Item = &OrderEntry> {
        self.orders.values()
    }

    pub fn remove_order(&mut self, id: i64) -> Option<Order> {
        self.orders.remove(&id).map(|e| e.order)
    }

    /// Adopt a polled tracker status. Orders with an outstanding request or
    /// an exit animation keep their local state until it settles.
    pub fn apply_tracker(&mut self, id: i64, status: OrderStatus) -> bool {
        let Some(entry) = self.orders.get_mut(&id) else {
            return false;
        };
        if entry.in_flight || entry.is_removing() {
            debug!(order_id = id, "tracker update deferred: order busy");
            return false;
        }
        if status == OrderStatus::Rejected {
            self.orders.remove(&id);
            return true;
        }
        if entry.order.status == status {
            return false;
        }
        entry.order.status = status;
        true
    }

    // -- Stock ----------------------------------------------------------------

    pub fn set_food_stock(&mut self, stock: HashMap<String, i64>) {
        self.food_stock = Some(stock);
    }

    pub fn food_stock(&self) -> Option<&HashMap<String, i64>> {
        self.food_stock.as_ref()
    }

    /// Current stock for a food; absent foods count as zero.
    pub fn food_stock_of(&self, food: &str) -> i64 {
        self.food_stock
            .as_ref()
            .and_then(|m| m.get(food).copied())
            .unwrap_or(0)
    }

    pub fn set_ingredient_stock(&mut self, name: &str, stock: i64) {
        self.ingredient_stock.insert(name.to_string(), stock);
    }

    pub fn ingredient_stock_of(&self, name: &str) -> i64 {
        self.ingredient_stock.get(name).copied().unwrap_or(0)
    }

    pub(crate) fn set_food_stock_of(&mut self, food: &str, stock: i64) {
        self.food_stock
            .get_or_insert_with(HashMap::new)
            .insert(food.to_string(), stock);
    }

    /// Replace the ingredient table (initial inventory render).
    pub fn load_ingredients(&mut self, items: impl IntoIterator<Item = (String, i64)>) {
        self.ingredient_stock = items.into_iter().collect();
    }

    /// Stock of a form target as last loaded from the server, or `None`
    /// when it was never loaded.
    pub fn known_stock(&self, target: &StockTarget) -> Option<i64> {
        match target {
            StockTarget::Food(name) => self.food_stock.as_ref()?.get(name).copied(),
            StockTarget::Ingredient(name) => self.ingredient_stock.get(name).copied(),
        }
    }

    pub(crate) fn set_stock(&mut self, target: &StockTarget, stock: i64) {
        match target {
            StockTarget::Food(name) => self.set_food_stock_of(name, stock),
            StockTarget::Ingredient(name) => self.set_ingredient_stock(name, stock),
        }
    }

    pub(crate) fn forget_stock(&mut self, target: &StockTarget) {
        match target {
            StockTarget::Food(name) => {
                if let Some(map) = self.food_stock.as_mut() {
                    map.remove(name);
                }
            }
            StockTarget::Ingredient(name) => {
                self.ingredient_stock.remove(name);
            }
        }
    }

    // -- Menu -----------------------------------------------------------------

    pub fn load_menu(&mut self, items: impl IntoIterator<Item = (String, Availability)>) {
        self.menu = items
            .into_iter()
            .map(|(food, availability)| {
                let item = MenuItem {
                    food: food.clone(),
                    availability,
                    updating: false,
                };
                (food, item)
            })
            .collect();
    }

    // -- Notifications --------------------------------------------------------

    /// Replace the active set with a fresh snapshot, minus locally read ids.
    pub fn replace_notifications(&mut self, snapshot: Vec<Notification>) {
        let read = &self.read_notifications;
        self.notifications = snapshot
            .into_iter()
            .filter(|n| !read.contains(&n.id))
            .collect();
        self.last_notification_poll = Some(Utc::now());
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Record a notification as read. Returns `false` if it already was.
    pub fn mark_notification_read(&mut self, id: i64) -> bool {
        if !self.read_notifications.insert(id) {
            return false;
        }
        self.notifications.retain(|n| n.id != id);
        true
    }

    pub fn set_permission(&mut self, permission: NotificationPermission) {
        self.permission = permission;
    }
}

/// Cloneable handle to the shared state.
#[derive(Clone, Default)]
pub struct StateHandle {
    inner: Arc<Mutex<DeskState>>,
}

impl StateHandle {
    pub fn new(state: DeskState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeskState> {
        // State stays consistent between statements, so a panic elsewhere
        // does not invalidate it.
        self.inner.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn read<R>(&self, f: impl FnOnce(&DeskState) -> R) -> R {
        f(&self.lock())
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut DeskState) -> R) -> R {
        f(&mut self.lock())
    }

    /// Mark `order_id` in flight. Fails when it is unknown, already busy or
    /// still leaving its old table.
    pub fn begin_order_request(&self, order_id: i64) -> DeskResult<InFlightGuard> {
        self.write(|s| {
            let entry = s.order_mut(order_id).ok_or(DeskError::NotFound(order_id))?;
            if entry.in_flight || entry.is_removing() {
                return Err(DeskError::InFlight(order_id));
            }
            entry.in_flight = true;
            Ok(())
        })?;
        Ok(InFlightGuard {
            state: self.clone(),
            order_id,
        })
    }
}

/// Clears the in-flight flag of an order when dropped.
pub struct InFlightGuard {
    state: StateHandle,
    order_id: i64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let id = self.order_id;
        self.state.write(|s| {
            if let Some(entry) = s.order_mut(id) {
                entry.in_flight = false;
            }
        });
    }
}
