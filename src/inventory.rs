//! Inventory stock forms for foods and ingredients.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::DeskContext;
use crate::error::{DeskError, DeskResult};
use crate::events::{Toast, UiEvent};
use crate::models::{StockFormMode, StockTarget};
use crate::state::DeskState;
use crate::stock::{StockBand, LOW_STOCK_THRESHOLD};

const INVALID_STOCK_MESSAGE: &str = "⚠️ Please enter a valid non-negative stock number.";
const UNKNOWN_STOCK_MESSAGE: &str = "Current stock is not loaded yet. Refresh the inventory and try again.";

/// A submitted stock form.
#[derive(Debug, Clone, Deserialize)]
pub struct StockForm {
    pub target: StockTarget,
    #[serde(default)]
    pub mode: StockFormMode,
    /// Raw text of the quantity input.
    pub input: String,
}

/// Parse the quantity input: a non-negative whole number.
pub fn parse_stock_input(raw: &str) -> DeskResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 0)
        .ok_or_else(|| DeskError::Validation(INVALID_STOCK_MESSAGE.to_string()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryRow {
    pub name: String,
    pub stock: i64,
    pub low: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryView {
    pub foods: Vec<InventoryRow>,
    pub ingredients: Vec<InventoryRow>,
}

pub fn project(state: &DeskState) -> InventoryView {
    let row = |(name, stock): (&String, &i64)| InventoryRow {
        name: name.clone(),
        stock: *stock,
        low: StockBand::classify(*stock, 0) == StockBand::Low,
    };
    let mut foods: Vec<InventoryRow> = state
        .food_stock()
        .map(|m| m.iter().map(row).collect())
        .unwrap_or_default();
    foods.sort_by(|a, b| a.name.cmp(&b.name));
    InventoryView {
        foods,
        ingredients: state.ingredient_stock.iter().map(row).collect(),
    }
}

#[derive(Clone)]
pub struct Inventory {
    ctx: DeskContext,
}

impl Inventory {
    pub fn new(ctx: DeskContext) -> Self {
        Self { ctx }
    }

    fn render(&self) {
        let view = self.ctx.state.read(project);
        self.ctx.emit(UiEvent::Inventory(view));
    }

    fn current_stock(&self, target: &StockTarget) -> Option<i64> {
        self.ctx.state.read(|s| s.known_stock(target))
    }

    fn set_stock(&self, target: &StockTarget, stock: i64) {
        self.ctx.state.write(|s| s.set_stock(target, stock));
    }

    /// Validate and submit a stock form. Returns the stock that was saved.
    pub async fn submit(&self, form: &StockForm) -> DeskResult<i64> {
        if !self.ctx.state.read(|s| s.session().role.can_manage_inventory()) {
            let msg = "You are not allowed to update stock.".to_string();
            self.ctx.toast(Toast::info(msg.clone()));
            return Err(DeskError::Forbidden(msg));
        }
        let amount = match parse_stock_input(&form.input) {
            Ok(n) => n,
            Err(e) => {
                self.ctx.toast(Toast::error(INVALID_STOCK_MESSAGE));
                return Err(e);
            }
        };

        let item = form.target.name().to_string();
        let current = self.current_stock(&form.target);
        let final_stock = match (form.mode, current) {
            (StockFormMode::Add, Some(current)) => current.saturating_add(amount),
            // The server takes an absolute value; adding to a guess would
            // overwrite its stock.
            (StockFormMode::Add, None) => {
                warn!(item = %item, "stock add refused: current stock unknown");
                self.ctx.toast(Toast::error(UNKNOWN_STOCK_MESSAGE));
                return Err(DeskError::Validation(UNKNOWN_STOCK_MESSAGE.to_string()));
            }
            (StockFormMode::Replace, _) => amount,
        };

        self.set_stock(&form.target, final_stock);
        self.render();

        match self
            .ctx
            .call(self.ctx.api.update_stock(&form.target, final_stock))
            .await
        {
            Ok(()) => {
                info!(item = %item, stock = final_stock, "stock updated");
                let message = match form.mode {
                    StockFormMode::Add => {
                        format!("✅ {item} stock increased by {}!", form.input.trim())
                    }
                    StockFormMode::Replace => format!("✅ {item} stock updated to {final_stock}!"),
                };
                self.ctx.toast(Toast::success(message));
                if final_stock <= LOW_STOCK_THRESHOLD {
                    warn!(item = %item, stock = final_stock, "stock is running low");
                }
                Ok(final_stock)
            }
            Err(e) => {
                warn!(item = %item, error = %e, "stock update failed");
                self.ctx.state.write(|s| match current {
                    Some(stock) => s.set_stock(&form.target, stock),
                    None => s.forget_stock(&form.target),
                });
                self.render();
                let text = e
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| e.to_string());
                self.ctx
                    .toast(Toast::error(format!("❌ Error updating stock: {text}")));
                Err(e)
            }
        }
    }
}
