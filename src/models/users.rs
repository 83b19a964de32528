use crate::schema::users;
use axum_login::AuthUser;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user profile row. `parent_id` is null for master accounts; sub-accounts
/// reference their master through it.
#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, skip_deserializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub parent_id: Option<Uuid>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Master accounts (null parent) gate access to brand-positioning and
    /// TensorZero management endpoints.
    #[must_use]
    pub const fn is_master(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl AuthUser for User {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn session_auth_hash(&self) -> &[u8] {
        // Use the password hash to ensure sessions are invalidated on password change.
        self.password_hash.as_bytes()
    }
}

/// Represents data needed to create a new user.
#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub parent_id: Option<Uuid>,
}

/// Whitelisted profile fields a user may update about themselves.
/// Unknown fields in the request body are dropped by serde, mirroring the
/// field whitelist applied to profile updates.
#[derive(AsChangeset, Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[diesel(table_name = users)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub company: Option<String>,
    pub phone: Option<String>,
    pub onboarding_completed: Option<bool>,
}

impl UpdateProfileRequest {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.phone.is_none()
            && self.onboarding_completed.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(parent_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            username: "acme".to_string(),
            email: "acme@example.com".to_string(),
            password_hash: "hashed_password".to_string(),
            name: Some("Acme Owner".to_string()),
            company: Some("Acme Inc".to_string()),
            phone: None,
            parent_id,
            onboarding_completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_struct_and_auth_impl() {
        let user = test_user(None);
        assert_eq!(user.username, "acme");
        assert_eq!(axum_login::AuthUser::id(&user), user.id);
        assert_eq!(user.session_auth_hash(), user.password_hash.as_bytes());
    }

    #[test]
    fn test_master_account_is_parentless() {
        assert!(test_user(None).is_master());
        assert!(!test_user(Some(Uuid::new_v4())).is_master());
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = test_user(None);
        let json = serde_json::to_value(&user).expect("serialize user");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "acme");
    }

    #[test]
    fn test_update_request_drops_unknown_fields() {
        let parsed: UpdateProfileRequest = serde_json::from_str(
            r#"{"name":"New Name","parent_id":"not-allowed","role":"admin"}"#,
        )
        .expect("deserialize update payload");
        assert_eq!(parsed.name.as_deref(), Some("New Name"));
        assert!(parsed.company.is_none());
        assert!(parsed.onboarding_completed.is_none());
    }

    #[test]
    fn test_update_request_is_empty() {
        assert!(UpdateProfileRequest::default().is_empty());
        let update = UpdateProfileRequest {
            onboarding_completed: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
