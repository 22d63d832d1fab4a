//! Stock annotator: per-food stock compared against order quantities.

use serde::Serialize;
use tracing::{debug, warn};

use crate::context::DeskContext;
use crate::error::DeskResult;

/// At or below this many units a food is flagged as running low.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBand {
    Insufficient,
    Low,
    Sufficient,
}

impl StockBand {
    pub fn classify(stock: i64, required: i64) -> StockBand {
        if stock < required {
            StockBand::Insufficient
        } else if stock <= LOW_STOCK_THRESHOLD {
            StockBand::Low
        } else {
            StockBand::Sufficient
        }
    }

    pub fn background(&self) -> &'static str {
        match self {
            StockBand::Insufficient => "rgba(244, 67, 54, 0.2)",
            StockBand::Low => "rgba(255, 193, 7, 0.2)",
            StockBand::Sufficient => "rgba(76, 175, 80, 0.2)",
        }
    }
}

/// Annotated stock cell of an order row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockCell {
    pub food: String,
    pub available: i64,
    pub required: i64,
    pub band: StockBand,
    pub title: String,
    pub background: &'static str,
}

pub fn annotate(food: &str, available: i64, required: i64) -> StockCell {
    let band = StockBand::classify(available, required);
    let title = match band {
        StockBand::Insufficient => {
            format!("Insufficient stock! Available: {available}, Needed: {required}")
        }
        StockBand::Low => "Low stock warning".to_string(),
        StockBand::Sufficient => "Sufficient stock available".to_string(),
    };
    StockCell {
        food: food.to_string(),
        available,
        required,
        band,
        title,
        background: band.background(),
    }
}

/// Fetches food stock and re-projects annotated rows.
#[derive(Clone)]
pub struct StockAnnotator {
    ctx: DeskContext,
}

impl StockAnnotator {
    pub fn new(ctx: DeskContext) -> Self {
        Self { ctx }
    }

    /// Fetch `/get_food_stock` and re-render. Safe to call concurrently.
    pub async fn refresh(&self) -> DeskResult<()> {
        match self.ctx.call(self.ctx.api.food_stock()).await {
            Ok(stock) => {
                debug!(foods = stock.len(), "food stock refreshed");
                self.ctx.state.write(|s| s.set_food_stock(stock));
                self.ctx.render_dashboard();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Error loading stock info");
                Err(e)
            }
        }
    }

    /// Refresh once the configured delay has passed (after stock-changing
    /// operations such as approval).
    pub fn schedule_refresh(&self) {
        let this = self.clone();
        let delay = self.ctx.config.stock_refresh_delay();
        self.ctx.spawn_after(delay, "stock_refresh", async move {
            let _ = this.refresh().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_follow_thresholds() {
        assert_eq!(StockBand::classify(3, 5), StockBand::Insufficient);
        assert_eq!(StockBand::classify(4, 4), StockBand::Low);
        assert_eq!(StockBand::classify(5, 1), StockBand::Low);
        assert_eq!(StockBand::classify(10, 5), StockBand::Sufficient);
        assert_eq!(StockBand::classify(6, 6), StockBand::Sufficient);
    }

    #[test]
    fn test_insufficient_title_names_both_quantities() {
        let cell = annotate("Adobo", 3, 5);
        assert_eq!(cell.band, StockBand::Insufficient);
        assert_eq!(cell.title, "Insufficient stock! Available: 3, Needed: 5");
        assert_eq!(cell.background, "rgba(244, 67, 54, 0.2)");
    }

    #[test]
    fn test_low_and_sufficient_titles() {
        assert_eq!(annotate("Adobo", 4, 1).title, "Low stock warning");
        assert_eq!(annotate("Adobo", 10, 1).title, "Sufficient stock available");
    }
}
