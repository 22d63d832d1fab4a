//! Three-stage progress tracker (Preparing → Cooking → Ready).

use serde::Serialize;

use crate::models::{OrderStatus, TrackerStage};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerStep {
    pub stage: TrackerStage,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerView {
    pub order_id: i64,
    pub steps: Vec<TrackerStep>,
    /// Width of the progress line, 0–100.
    pub progress_percent: f64,
    /// Steps are clickable only for roles that may advance orders.
    pub interactive: bool,
}

/// Number of leading steps reached for a status.
pub fn active_steps(status: OrderStatus) -> usize {
    match status {
        OrderStatus::Approved | OrderStatus::Preparing => 1,
        OrderStatus::Cooking => 2,
        OrderStatus::Ready => 3,
        OrderStatus::Pending | OrderStatus::Served | OrderStatus::Rejected => 0,
    }
}

/// `(active - 1) / (steps - 1) * 100`, or 0 with no step reached.
pub fn progress_percent(active: usize) -> f64 {
    let total = TrackerStage::ALL.len();
    if active == 0 {
        return 0.0;
    }
    ((active.min(total) - 1) as f64 / (total - 1) as f64) * 100.0
}

pub fn project(order_id: i64, status: OrderStatus, interactive: bool) -> TrackerView {
    let active = active_steps(status);
    let steps = TrackerStage::ALL
        .iter()
        .enumerate()
        .map(|(i, stage)| TrackerStep {
            stage: *stage,
            label: stage.label(),
            active: i < active,
        })
        .collect();
    TrackerView {
        order_id,
        steps,
        progress_percent: progress_percent(active),
        interactive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_flags(view: &TrackerView) -> Vec<bool> {
        view.steps.iter().map(|s| s.active).collect()
    }

    #[test]
    fn test_cooking_activates_two_steps_at_half() {
        let view = project(1, OrderStatus::Cooking, true);
        assert_eq!(active_flags(&view), vec![true, true, false]);
        assert_eq!(view.progress_percent, 50.0);
    }

    #[test]
    fn test_ready_activates_all_steps() {
        let view = project(1, OrderStatus::Ready, true);
        assert_eq!(active_flags(&view), vec![true, true, true]);
        assert_eq!(view.progress_percent, 100.0);
    }

    #[test]
    fn test_approved_and_preparing_share_first_step() {
        for status in [OrderStatus::Approved, OrderStatus::Preparing] {
            let view = project(1, status, false);
            assert_eq!(active_flags(&view), vec![true, false, false]);
            assert_eq!(view.progress_percent, 0.0);
        }
    }

    #[test]
    fn test_pending_has_no_progress() {
        let view = project(1, OrderStatus::Pending, false);
        assert!(view.steps.iter().all(|s| !s.active));
        assert_eq!(view.progress_percent, 0.0);
    }

    #[test]
    fn test_progress_is_monotonic_in_stage() {
        let order = [
            OrderStatus::Preparing,
            OrderStatus::Cooking,
            OrderStatus::Ready,
        ];
        let widths: Vec<f64> = order
            .iter()
            .map(|s| progress_percent(active_steps(*s)))
            .collect();
        assert!(widths.windows(2).all(|w| w[0] < w[1]));
    }
}
