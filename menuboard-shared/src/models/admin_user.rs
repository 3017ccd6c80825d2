/// Admin user model and database operations
///
/// Admin users are the people who log into the back office: restaurant staff
/// scoped to one tenant, or platform super admins with no tenant.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE admin_role AS ENUM ('super_admin', 'owner', 'manager', 'staff');
///
/// CREATE TABLE admin_users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID REFERENCES tenants(id) ON DELETE CASCADE,
///     email VARCHAR(255) NOT NULL,          -- unique on LOWER(email)
///     password_hash VARCHAR(255) NOT NULL,
///     full_name VARCHAR(255),
///     role admin_role NOT NULL DEFAULT 'staff',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use menuboard_shared::models::admin_user::{AdminUser, AdminRole, CreateAdminUser};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, tenant_id: Uuid) -> Result<(), sqlx::Error> {
/// let user = AdminUser::create(&pool, CreateAdminUser {
///     tenant_id: Some(tenant_id),
///     email: "chef@pizza-roma.it".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     full_name: Some("Mario".to_string()),
///     role: AdminRole::Staff,
/// }).await?;
///
/// let found = AdminUser::find_by_email(&pool, "CHEF@pizza-roma.it").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Back-office roles
///
/// `Owner > Manager > Staff` inside a tenant. `SuperAdmin` is platform wide
/// and never belongs to a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "admin_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Platform operator: tenants, billing overview, landing page
    SuperAdmin,

    /// Full control of one restaurant, including users and billing
    Owner,

    /// Menu, appearance and QR codes
    Manager,

    /// Order and waiter call handling
    Staff,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::Owner => "owner",
            AdminRole::Manager => "manager",
            AdminRole::Staff => "staff",
        }
    }

    /// Parses the string form used in JWT claims
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "super_admin" => Some(AdminRole::SuperAdmin),
            "owner" => Some(AdminRole::Owner),
            "manager" => Some(AdminRole::Manager),
            "staff" => Some(AdminRole::Staff),
            _ => None,
        }
    }

    /// Can update order and waiter call status
    pub fn can_handle_service(&self) -> bool {
        self.has_permission(&AdminRole::Staff)
    }

    /// Can edit categories, products, appearance and QR codes
    pub fn can_manage_menu(&self) -> bool {
        self.has_permission(&AdminRole::Manager)
    }

    /// Can add, change and remove admin users
    pub fn can_manage_users(&self) -> bool {
        self.has_permission(&AdminRole::Owner)
    }

    /// Can start checkouts and view payments
    pub fn can_manage_billing(&self) -> bool {
        self.has_permission(&AdminRole::Owner)
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, AdminRole::SuperAdmin)
    }

    /// Checks if this role has at least the permission level of `required`
    ///
    /// Hierarchy: SuperAdmin > Owner > Manager > Staff
    pub fn has_permission(&self, required: &AdminRole) -> bool {
        self.permission_level() >= required.permission_level()
    }

    fn permission_level(&self) -> u8 {
        match self {
            AdminRole::SuperAdmin => 4,
            AdminRole::Owner => 3,
            AdminRole::Manager => 2,
            AdminRole::Staff => 1,
        }
    }
}

/// Back-office account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminUser {
    pub id: Uuid,

    /// Owning restaurant (None for super admins)
    pub tenant_id: Option<Uuid>,

    /// Lowercased email address
    pub email: String,

    /// Argon2id hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub full_name: Option<String>,
    pub role: AdminRole,

    /// Inactive users cannot log in
    pub is_active: bool,

    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an admin user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAdminUser {
    pub tenant_id: Option<Uuid>,
    pub email: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub full_name: Option<String>,
    pub role: AdminRole,
}

/// Input for updating an admin user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAdminUser {
    pub email: Option<String>,
    pub password_hash: Option<String>,

    /// Use Some(None) to clear
    pub full_name: Option<Option<String>>,

    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

const ADMIN_USER_COLUMNS: &str = "id, tenant_id, email, password_hash, full_name, role, \
     is_active, last_login_at, created_at, updated_at";

impl AdminUser {
    /// Creates an admin user
    ///
    /// The email is lowercased before insert.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (`admin_users_email_key`)
    /// - Tenant scope doesn't match the role (`admin_users_tenant_scope`)
    pub async fn create<'e, E>(executor: E, data: CreateAdminUser) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, AdminUser>(&format!(
            r#"
            INSERT INTO admin_users (tenant_id, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ADMIN_USER_COLUMNS}
            "#
        ))
        .bind(data.tenant_id)
        .bind(normalize_email(&data.email))
        .bind(data.password_hash)
        .bind(data.full_name)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by ID within one tenant
    pub async fn find_in_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin_users WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin_users WHERE LOWER(email) = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await
    }

    /// Updates a user within one tenant
    ///
    /// Returns None if the user doesn't exist in that tenant.
    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateAdminUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE admin_users SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.full_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", full_name = ${}", bind_count));
        }
        if data.role.is_some() {
            bind_count += 1;
            query.push_str(&format!(", role = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND tenant_id = $2 RETURNING {ADMIN_USER_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, AdminUser>(&query).bind(id).bind(tenant_id);

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(full_name) = data.full_name {
            q = q.bind(full_name);
        }
        if let Some(role) = data.role {
            q = q.bind(role);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes a user within one tenant
    pub async fn delete(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admin_users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE admin_users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists a tenant's users, oldest first
    pub async fn list_by_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminUser>(&format!(
            "SELECT {ADMIN_USER_COLUMNS} FROM admin_users WHERE tenant_id = $1 ORDER BY created_at"
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await
    }

    /// Counts active owners of a tenant
    ///
    /// Used to refuse changes that would leave a restaurant without an owner.
    pub async fn count_active_owners(pool: &PgPool, tenant_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin_users WHERE tenant_id = $1 AND role = 'owner' AND is_active",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await
    }
}

/// Lowercases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(AdminRole::SuperAdmin.has_permission(&AdminRole::Owner));
        assert!(AdminRole::Owner.has_permission(&AdminRole::Manager));
        assert!(AdminRole::Manager.has_permission(&AdminRole::Staff));
        assert!(!AdminRole::Staff.has_permission(&AdminRole::Manager));
        assert!(!AdminRole::Manager.has_permission(&AdminRole::Owner));
    }

    #[test]
    fn test_role_capabilities() {
        assert!(AdminRole::Staff.can_handle_service());
        assert!(!AdminRole::Staff.can_manage_menu());

        assert!(AdminRole::Manager.can_manage_menu());
        assert!(!AdminRole::Manager.can_manage_users());
        assert!(!AdminRole::Manager.can_manage_billing());

        assert!(AdminRole::Owner.can_manage_users());
        assert!(AdminRole::Owner.can_manage_billing());
        assert!(!AdminRole::Owner.is_super_admin());
        assert!(AdminRole::SuperAdmin.is_super_admin());
    }

    #[test]
    fn test_role_string_forms() {
        for role in [
            AdminRole::SuperAdmin,
            AdminRole::Owner,
            AdminRole::Manager,
            AdminRole::Staff,
        ] {
            assert_eq!(AdminRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(AdminRole::parse("admin"), None);
        assert_eq!(
            serde_json::to_string(&AdminRole::SuperAdmin).unwrap(),
            "\"super_admin\""
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Chef@Example.COM "), "chef@example.com");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = AdminUser {
            id: Uuid::new_v4(),
            tenant_id: None,
            email: "root@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: None,
            role: AdminRole::SuperAdmin,
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
    }
}
