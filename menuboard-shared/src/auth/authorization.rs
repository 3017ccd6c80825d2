/// Role-based authorization for the back office
///
/// Checks are pure functions of the [`AuthContext`] built from the access
/// token. Tenant checks return the caller's tenant id so handlers scope every
/// query with it:
///
/// ```
/// use menuboard_shared::auth::authorization::{require_permission, Permission};
/// use menuboard_shared::auth::middleware::AuthContext;
/// use menuboard_shared::models::admin_user::AdminRole;
/// use uuid::Uuid;
///
/// let auth = AuthContext { user_id: Uuid::new_v4(), tenant_id: Some(Uuid::new_v4()), role: AdminRole::Staff };
/// assert!(require_permission(&auth, Permission::HandleService).is_ok());
/// assert!(require_permission(&auth, Permission::ManageMenu).is_err());
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::admin_user::AdminRole;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    #[error("This account is not attached to a restaurant")]
    NoTenant,

    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole {
        required: AdminRole,
        actual: AdminRole,
    },

    #[error("Super admin access required")]
    SuperAdminOnly,

    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// What a back-office request is about to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read orders, menu, settings and waiter calls
    View,

    /// Update order and waiter call status
    HandleService,

    /// Edit the menu, appearance and QR codes
    ManageMenu,

    ManageUsers,

    ManageBilling,
}

impl Permission {
    pub fn min_role(&self) -> AdminRole {
        match self {
            Permission::View | Permission::HandleService => AdminRole::Staff,
            Permission::ManageMenu => AdminRole::Manager,
            Permission::ManageUsers | Permission::ManageBilling => AdminRole::Owner,
        }
    }
}

pub fn require_role(auth: &AuthContext, required: AdminRole) -> Result<(), AuthzError> {
    if !auth.role.has_permission(&required) {
        return Err(AuthzError::InsufficientRole {
            required,
            actual: auth.role,
        });
    }

    Ok(())
}

/// Tenant of a restaurant account; super admins have none
pub fn require_tenant(auth: &AuthContext) -> Result<Uuid, AuthzError> {
    auth.tenant_id.ok_or(AuthzError::NoTenant)
}

/// Checks the role for `permission` and returns the caller's tenant id
pub fn require_permission(auth: &AuthContext, permission: Permission) -> Result<Uuid, AuthzError> {
    let tenant_id = require_tenant(auth)?;
    require_role(auth, permission.min_role())?;
    Ok(tenant_id)
}

pub fn require_super_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.role.is_super_admin() {
        return Err(AuthzError::SuperAdminOnly);
    }

    Ok(())
}

/// Rejects an action an admin may not take on their own account
pub fn forbid_self(auth: &AuthContext, target_user_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id == target_user_id {
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}
