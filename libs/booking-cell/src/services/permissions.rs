// =====================================================================================
// ROLE PERMISSION SERVICE
// =====================================================================================

use std::collections::HashMap;

/// Role → allowed-action lookup. The admin entry is the wildcard `*`; every
/// other role requires an exact action match.
pub struct RolePermissionService {
    permissions: HashMap<String, Vec<String>>,
}

impl RolePermissionService {
    pub fn new() -> Self {
        let mut permissions = HashMap::new();
        permissions.insert(
            "guest".to_string(),
            vec![
                "create_booking".to_string(),
                "cancel_own_booking".to_string(),
                "view_own_bookings".to_string(),
                "update_own_profile".to_string(),
            ],
        );
        permissions.insert(
            "host".to_string(),
            vec![
                "create_booking".to_string(),
                "cancel_own_booking".to_string(),
                "view_own_bookings".to_string(),
                "update_own_profile".to_string(),
                "manage_listing".to_string(),
                "update_price".to_string(),
                "view_property_bookings".to_string(),
            ],
        );
        permissions.insert("admin".to_string(), vec!["*".to_string()]);

        Self { permissions }
    }

    pub fn validate_role_permissions(&self, role: &str, action: &str) -> bool {
        match self.permissions.get(role) {
            Some(actions) => {
                actions.iter().any(|a| a == "*") || actions.iter().any(|a| a == action)
            }
            None => false,
        }
    }
}

impl Default for RolePermissionService {
    fn default() -> Self {
        Self::new()
    }
}
