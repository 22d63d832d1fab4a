//! Session role resolution and permission checks.
//!
//! The server is expected to hand the client an explicit role. Older page
//! payloads do not, so the role can still be inferred from the same page
//! signals the customer notification bell used to sniff.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
    Admin,
    Anonymous,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Role::Customer),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            "anonymous" | "guest" => Ok(Role::Anonymous),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

impl Role {
    /// Only logged-in customers get the notification bell.
    pub fn receives_notifications(&self) -> bool {
        matches!(self, Role::Customer)
    }

    /// Staff run the kitchen; admins see the order tables read-only.
    pub fn can_update_orders(&self) -> bool {
        matches!(self, Role::Staff)
    }

    pub fn can_manage_inventory(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }

    /// Message shown when this role tries an order action it cannot perform.
    pub fn order_action_denied(&self, action: &str) -> String {
        match self {
            Role::Admin => format!("Admin cannot {action} orders. Please contact staff."),
            _ => format!("You are not allowed to {action} orders."),
        }
    }
}

/// Rendered-page hints used when no explicit role was supplied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSignals {
    /// The page body carries the `admin` class.
    #[serde(default)]
    pub admin_body_class: bool,
    /// A menu availability toggle is present on the page.
    #[serde(default)]
    pub has_availability_toggle: bool,
    #[serde(default)]
    pub header_text: String,
    /// Text of the profile button; `None` when the page has none.
    #[serde(default)]
    pub profile_label: Option<String>,
}

impl PageSignals {
    pub fn infer_role(&self) -> Role {
        if self.admin_body_class || self.header_text.contains("Admin") {
            return Role::Admin;
        }
        if self.has_availability_toggle || self.header_text.contains("Staff") {
            return Role::Staff;
        }
        match self.profile_label.as_deref() {
            None => Role::Anonymous,
            Some(label) if label.contains("Login") => Role::Anonymous,
            Some(_) => Role::Customer,
        }
    }
}

/// The role the client acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Session {
    pub role: Role,
    /// `false` when the role came from page signals.
    pub explicit: bool,
}

impl Session {
    pub fn resolve(explicit: Option<Role>, signals: Option<&PageSignals>) -> Session {
        if let Some(role) = explicit {
            return Session {
                role,
                explicit: true,
            };
        }
        let role = signals
            .map(PageSignals::infer_role)
            .unwrap_or(Role::Anonymous);
        debug!(?role, "session role inferred from page signals");
        Session {
            role,
            explicit: false,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session {
            role: Role::Anonymous,
            explicit: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_page() -> PageSignals {
        PageSignals {
            admin_body_class: false,
            has_availability_toggle: false,
            header_text: "Leshley's Eatery".into(),
            profile_label: Some("Maria".into()),
        }
    }

    #[test]
    fn test_explicit_role_wins_over_signals() {
        let session = Session::resolve(Some(Role::Staff), Some(&customer_page()));
        assert_eq!(session.role, Role::Staff);
        assert!(session.explicit);
    }

    #[test]
    fn test_customer_inferred_from_profile() {
        let session = Session::resolve(None, Some(&customer_page()));
        assert_eq!(session.role, Role::Customer);
        assert!(!session.explicit);
        assert!(session.role.receives_notifications());
    }

    #[test]
    fn test_login_label_means_anonymous() {
        let mut page = customer_page();
        page.profile_label = Some("Login".into());
        assert_eq!(page.infer_role(), Role::Anonymous);
        page.profile_label = None;
        assert_eq!(page.infer_role(), Role::Anonymous);
    }

    #[test]
    fn test_staff_and_admin_markers() {
        let mut page = customer_page();
        page.has_availability_toggle = true;
        assert_eq!(page.infer_role(), Role::Staff);

        let mut page = customer_page();
        page.header_text = "Admin Dashboard".into();
        assert_eq!(page.infer_role(), Role::Admin);
        assert!(!page.infer_role().receives_notifications());
    }

    #[test]
    fn test_admin_cannot_update_orders() {
        assert!(!Role::Admin.can_update_orders());
        assert!(Role::Staff.can_update_orders());
        assert_eq!(
            Role::Admin.order_action_denied("approve"),
            "Admin cannot approve orders. Please contact staff."
        );
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Staff".parse::<Role>(), Ok(Role::Staff));
        assert!("chef".parse::<Role>().is_err());
    }
}
