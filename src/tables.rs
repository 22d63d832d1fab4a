//! Table reconciler: projects the order collection into the dashboard
//! tables.
//!
//! Projection is pure. A table with no order rows always carries exactly
//! one placeholder row spanning every column, so the empty-state check
//! holds after any mutation simply by re-projecting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::Role;
use crate::models::{Order, OrderStatus};
use crate::state::{DeskState, OrderEntry};
use crate::stock::{self, StockCell};
use crate::tracker::{self, TrackerView};

/// Text shown in the served-date column when the server sent none.
pub const SERVED_FALLBACK: &str = "Just now";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Pending,
    InProgress,
    ReadyForPickup,
    Served,
    Receipts,
}

impl TableKind {
    pub const ALL: [TableKind; 5] = [
        TableKind::Pending,
        TableKind::InProgress,
        TableKind::ReadyForPickup,
        TableKind::Served,
        TableKind::Receipts,
    ];

    pub fn columns(&self) -> usize {
        match self {
            TableKind::Pending => 8,
            TableKind::InProgress => 7,
            TableKind::ReadyForPickup => 8,
            TableKind::Served => 8,
            TableKind::Receipts => 4,
        }
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            TableKind::Pending => "No pending orders.",
            TableKind::InProgress => "No orders found.",
            TableKind::ReadyForPickup => "No ready to pick up orders.",
            TableKind::Served => "No served orders.",
            TableKind::Receipts => "No receipts uploaded.",
        }
    }

    /// Lifecycle table an order with `status` belongs to. Receipts are
    /// orthogonal to the lifecycle and rejected orders live nowhere.
    pub fn for_status(status: OrderStatus) -> Option<TableKind> {
        match status {
            OrderStatus::Pending => Some(TableKind::Pending),
            OrderStatus::Approved | OrderStatus::Preparing | OrderStatus::Cooking => {
                Some(TableKind::InProgress)
            }
            OrderStatus::Ready => Some(TableKind::ReadyForPickup),
            OrderStatus::Served => Some(TableKind::Served),
            OrderStatus::Rejected => None,
        }
    }

    fn holds(&self, entry: &OrderEntry) -> bool {
        match self {
            TableKind::Receipts => entry.order.receipt.is_some(),
            kind => TableKind::for_status(entry.placement_status()) == Some(*kind),
        }
    }

    /// Whether the row is animating out of this table.
    fn is_removing(&self, entry: &OrderEntry) -> bool {
        match self {
            // Receipts only lose a row when the whole order is deleted.
            TableKind::Receipts => {
                entry.is_removing() && entry.order.status == OrderStatus::Rejected
            }
            _ => entry.is_removing(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    pub order_id: i64,
    pub cells: Vec<String>,
    pub removing: bool,
    /// Action controls are disabled while a request is in flight or for
    /// roles that cannot act on orders.
    pub controls_disabled: bool,
    /// Value of the stage dropdown (in-progress rows).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_value: Option<OrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker: Option<TrackerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<StockCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableRow {
    Order(OrderRow),
    Placeholder { colspan: usize, message: &'static str },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub kind: TableKind,
    pub columns: usize,
    pub rows: Vec<TableRow>,
}

impl TableView {
    pub fn order_rows(&self) -> impl Iterator<Item = &OrderRow> {
        self.rows.iter().filter_map(|r| match r {
            TableRow::Order(row) => Some(row),
            TableRow::Placeholder { .. } => None,
        })
    }

    pub fn contains_order(&self, order_id: i64) -> bool {
        self.order_rows().any(|r| r.order_id == order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.order_rows().next().is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub role: Role,
    pub pending: TableView,
    pub in_progress: TableView,
    pub ready_for_pickup: TableView,
    pub served: TableView,
    pub receipts: TableView,
    pub generated_at: DateTime<Utc>,
}

impl DashboardView {
    pub fn table(&self, kind: TableKind) -> &TableView {
        match kind {
            TableKind::Pending => &self.pending,
            TableKind::InProgress => &self.in_progress,
            TableKind::ReadyForPickup => &self.ready_for_pickup,
            TableKind::Served => &self.served,
            TableKind::Receipts => &self.receipts,
        }
    }
}

fn price_cell(order: &Order) -> String {
    format!("₱{}", order.price)
}

fn base_cells(order: &Order) -> Vec<String> {
    vec![
        order.order_date.clone(),
        order.cust_name.clone(),
        order.cust_contact.clone(),
        order.food.clone(),
        order.quantity.to_string(),
        price_cell(order),
        order.payment_status.clone(),
    ]
}

fn project_row(kind: TableKind, entry: &OrderEntry, state: &DeskState) -> OrderRow {
    let order = &entry.order;
    let can_act = state.session().role.can_update_orders();
    let mut row = OrderRow {
        order_id: order.id,
        cells: Vec::new(),
        removing: kind.is_removing(entry),
        controls_disabled: entry.in_flight || !can_act,
        status_value: None,
        tracker: None,
        stock: None,
    };

    match kind {
        TableKind::Pending => {
            row.cells = base_cells(order);
            if state.food_stock().is_some() {
                row.stock = Some(stock::annotate(
                    &order.food,
                    state.food_stock_of(&order.food),
                    order.quantity,
                ));
            }
        }
        TableKind::InProgress => {
            row.cells = base_cells(order);
            let shown = entry.displayed_status();
            row.status_value = Some(shown);
            row.tracker = Some(tracker::project(order.id, shown, can_act));
        }
        TableKind::ReadyForPickup => {
            row.cells = base_cells(order);
        }
        TableKind::Served => {
            let mut cells = base_cells(order);
            cells.push(
                order
                    .served_date
                    .clone()
                    .unwrap_or_else(|| SERVED_FALLBACK.to_string()),
            );
            row.cells = cells;
        }
        TableKind::Receipts => {
            row.cells = vec![
                order.order_date.clone(),
                order.cust_name.clone(),
                order.food.clone(),
                order.receipt.clone().unwrap_or_default(),
            ];
        }
    }
    row
}

pub fn project_table(state: &DeskState, kind: TableKind) -> TableView {
    let mut rows: Vec<TableRow> = state
        .orders()
        .filter(|e| kind.holds(e))
        .map(|e| TableRow::Order(project_row(kind, e, state)))
        .collect();
    if rows.is_empty() {
        rows.push(TableRow::Placeholder {
            colspan: kind.columns(),
            message: kind.empty_message(),
        });
    }
    TableView {
        kind,
        columns: kind.columns(),
        rows,
    }
}

pub fn project(state: &DeskState) -> DashboardView {
    DashboardView {
        role: state.session().role,
        pending: project_table(state, TableKind::Pending),
        in_progress: project_table(state, TableKind::InProgress),
        ready_for_pickup: project_table(state, TableKind::ReadyForPickup),
        served: project_table(state, TableKind::Served),
        receipts: project_table(state, TableKind::Receipts),
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::state::tests::order;
    use std::collections::HashMap;

    fn staff_state(orders: Vec<Order>) -> DeskState {
        let mut state = DeskState::new(Session {
            role: Role::Staff,
            explicit: true,
        });
        state.load_orders(orders);
        state
    }

    #[test]
    fn test_empty_tables_get_single_placeholder() {
        let view = project(&staff_state(vec![]));
        for kind in TableKind::ALL {
            let table = view.table(kind);
            assert_eq!(table.rows.len(), 1);
            assert_eq!(
                table.rows[0],
                TableRow::Placeholder {
                    colspan: kind.columns(),
                    message: kind.empty_message(),
                }
            );
        }
    }

    #[test]
    fn test_orders_placed_by_status() {
        let view = project(&staff_state(vec![
            order(1, OrderStatus::Pending),
            order(2, OrderStatus::Approved),
            order(3, OrderStatus::Cooking),
            order(4, OrderStatus::Ready),
            order(5, OrderStatus::Served),
        ]));
        assert!(view.pending.contains_order(1));
        assert!(view.in_progress.contains_order(2));
        assert!(view.in_progress.contains_order(3));
        assert!(view.ready_for_pickup.contains_order(4));
        assert!(view.served.contains_order(5));
        assert!(view.receipts.is_empty());
    }

    #[test]
    fn test_departing_row_stays_in_source_table_flagged() {
        let mut state = staff_state(vec![order(1, OrderStatus::Cooking)]);
        {
            let entry = state.order_mut(1).unwrap();
            entry.order.status = OrderStatus::Ready;
            entry.departing_from = Some(OrderStatus::Cooking);
        }
        let view = project(&state);
        let row = view.in_progress.order_rows().next().unwrap();
        assert!(row.removing);
        assert!(view.ready_for_pickup.is_empty());
        // Tracker already reflects the new status.
        assert_eq!(row.tracker.as_ref().unwrap().progress_percent, 100.0);
    }

    #[test]
    fn test_served_row_falls_back_to_just_now() {
        let view = project(&staff_state(vec![order(7, OrderStatus::Served)]));
        let row = view.served.order_rows().next().unwrap();
        assert_eq!(row.cells.len(), 8);
        assert_eq!(row.cells[7], SERVED_FALLBACK);
        assert_eq!(row.cells[5], "₱150");
    }

    #[test]
    fn test_pending_rows_annotated_once_stock_known() {
        let mut state = staff_state(vec![order(1, OrderStatus::Pending)]);
        let view = project(&state);
        assert!(view.pending.order_rows().next().unwrap().stock.is_none());

        state.set_food_stock(HashMap::from([("Adobo".to_string(), 1)]));
        let view = project(&state);
        let cell = view.pending.order_rows().next().unwrap().stock.clone().unwrap();
        assert_eq!(cell.band, stock::StockBand::Insufficient);
    }

    #[test]
    fn test_receipts_only_flag_removal_on_delete() {
        let mut o = order(1, OrderStatus::Pending);
        o.receipt = Some("receipts/1.jpg".into());
        let mut state = staff_state(vec![o]);

        state.order_mut(1).unwrap().departing_from = Some(OrderStatus::Pending);
        state.order_mut(1).unwrap().order.status = OrderStatus::Approved;
        let view = project(&state);
        assert!(!view.receipts.order_rows().next().unwrap().removing);

        state.order_mut(1).unwrap().order.status = OrderStatus::Rejected;
        let view = project(&state);
        assert!(view.receipts.order_rows().next().unwrap().removing);
    }

    #[test]
    fn test_admin_rows_have_disabled_controls() {
        let mut state = DeskState::new(Session {
            role: Role::Admin,
            explicit: true,
        });
        state.load_orders(vec![order(1, OrderStatus::Preparing)]);
        let view = project(&state);
        let row = view.in_progress.order_rows().next().unwrap();
        assert!(row.controls_disabled);
        assert!(!row.tracker.as_ref().unwrap().interactive);
    }
}
