//! Menu availability toggles.
//!
//! Staff flip a food between Available / Not Available. The label switches
//! to "Updating..." while the request runs and reverts when it fails.

use serde::Serialize;
use tracing::{info, warn};

use crate::context::DeskContext;
use crate::error::{DeskError, DeskResult};
use crate::events::{Toast, UiEvent};
use crate::models::Availability;
use crate::state::DeskState;

const UPDATING_LABEL: &str = "Updating...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub food: String,
    pub availability: Availability,
    pub updating: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityItemView {
    pub food: String,
    pub checked: bool,
    pub label: &'static str,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityView {
    pub items: Vec<AvailabilityItemView>,
}

pub fn project(state: &DeskState) -> AvailabilityView {
    let items = state
        .menu
        .values()
        .map(|item| AvailabilityItemView {
            food: item.food.clone(),
            checked: item.availability == Availability::Available,
            label: if item.updating {
                UPDATING_LABEL
            } else {
                item.availability.label()
            },
            disabled: item.updating,
        })
        .collect();
    AvailabilityView { items }
}

#[derive(Clone)]
pub struct MenuAvailability {
    ctx: DeskContext,
}

impl MenuAvailability {
    pub fn new(ctx: DeskContext) -> Self {
        Self { ctx }
    }

    fn render(&self) {
        let view = self.ctx.state.read(project);
        self.ctx.emit(UiEvent::MenuAvailability(view));
    }

    /// Set a food's availability, optimistically.
    pub async fn set_availability(&self, food: &str, available: bool) -> DeskResult<String> {
        let food = food.trim();
        if food.is_empty() {
            self.ctx.toast(Toast::error("Food item missing"));
            return Err(DeskError::Validation("Food item missing".into()));
        }
        let target = Availability::from_checked(available);

        let previous = self.ctx.state.write(|s| {
            let item = s.menu.entry(food.to_string()).or_insert_with(|| MenuItem {
                food: food.to_string(),
                availability: target,
                updating: false,
            });
            if item.updating {
                return Err(DeskError::Validation(format!(
                    "{food} is already being updated"
                )));
            }
            let previous = item.availability;
            item.availability = target;
            item.updating = true;
            Ok(previous)
        })?;
        self.render();

        let result = self
            .ctx
            .call(self.ctx.api.update_availability(food, target))
            .await
            .and_then(|resp| match resp.message {
                Some(message) => Ok(message),
                None => Err(DeskError::Rejected {
                    message: resp
                        .error
                        .or_else(|| Some("Failed to update status".to_string())),
                    details: None,
                }),
            });

        self.ctx.state.write(|s| {
            if let Some(item) = s.menu.get_mut(food) {
                item.updating = false;
                if result.is_err() {
                    item.availability = previous;
                }
            }
        });
        self.render();

        match result {
            Ok(message) => {
                info!(food, status = target.label(), "menu availability updated");
                self.ctx.toast(Toast::success(message.clone()));
                Ok(message)
            }
            Err(e) => {
                warn!(food, error = %e, "menu availability update failed");
                self.ctx.toast(Toast::error("Failed to update status"));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::events::ToastKind;
    use crate::models::AvailabilityResponse;
    use crate::testing::{Fail, Harness};

    fn menu_harness() -> Harness {
        let h = Harness::new(Role::Staff, vec![]);
        h.ctx
            .state
            .write(|s| s.load_menu([("Adobo".to_string(), Availability::Available)]));
        h
    }

    #[tokio::test]
    async fn test_toggle_success_keeps_new_value() {
        let h = menu_harness();
        let menu = MenuAvailability::new(h.ctx.clone());

        let message = menu.set_availability("Adobo", false).await.unwrap();
        assert_eq!(message, "Status updated");
        assert_eq!(h.api.calls(), vec!["POST /update_status Adobo Not Available"]);

        let view = h.ctx.state.read(project);
        assert!(!view.items[0].checked);
        assert_eq!(view.items[0].label, "Not Available");
        assert!(!view.items[0].disabled);
    }

    #[tokio::test]
    async fn test_toggle_failure_reverts() {
        let h = menu_harness();
        *h.api.availability.lock().unwrap() = Err(Fail::Network);
        let menu = MenuAvailability::new(h.ctx.clone());

        assert!(menu.set_availability("Adobo", false).await.is_err());
        let view = h.ctx.state.read(project);
        assert!(view.items[0].checked);
        assert_eq!(view.items[0].label, "Available");

        let toast = h.sink.toasts().pop().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert_eq!(toast.message, "Failed to update status");
    }

    #[tokio::test]
    async fn test_response_without_message_is_failure() {
        let h = menu_harness();
        *h.api.availability.lock().unwrap() = Ok(AvailabilityResponse {
            message: None,
            error: Some("Unknown food".into()),
        });
        let menu = MenuAvailability::new(h.ctx.clone());
        assert!(menu.set_availability("Adobo", false).await.is_err());
        assert!(h.ctx.state.read(project).items[0].checked);
    }

    #[tokio::test]
    async fn test_missing_food_sends_nothing() {
        let h = menu_harness();
        let menu = MenuAvailability::new(h.ctx.clone());
        assert!(matches!(
            menu.set_availability("  ", true).await,
            Err(DeskError::Validation(_))
        ));
        assert!(h.api.calls().is_empty());
        assert_eq!(h.sink.toasts()[0].message, "Food item missing");
    }

    #[tokio::test]
    async fn test_label_shows_updating_while_in_flight() {
        let h = menu_harness();
        h.ctx.state.write(|s| {
            if let Some(item) = s.menu.get_mut("Adobo") {
                item.updating = true;
            }
        });
        let view = h.ctx.state.read(project);
        assert_eq!(view.items[0].label, UPDATING_LABEL);
        assert!(view.items[0].disabled);
    }
}
