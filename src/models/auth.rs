use secrecy::Secret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request body for POST /api/auth/register.
///
/// An optional `parent_id` creates a sub-account under an existing master.
#[derive(Deserialize, Debug, Clone, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    // Length is checked in the register handler; validator cannot look
    // inside a Secret.
    pub password: Secret<String>,
    pub parent_id: Option<Uuid>,
}

/// Minimum accepted password length, enforced at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Request body for POST /api/auth/login. The identifier matches either
/// username or email.
#[derive(Deserialize, Debug, Clone)]
pub struct LoginPayload {
    pub identifier: String,
    pub password: Secret<String>,
}

/// Public view of the authenticated user returned by auth endpoints.
#[derive(Serialize, Debug, Clone)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub parent_id: Option<Uuid>,
    pub onboarding_completed: bool,
}

impl From<&crate::models::users::User> for AuthResponse {
    fn from(user: &crate::models::users::User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            parent_id: user.parent_id,
            onboarding_completed: user.onboarding_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(username: &str, email: &str, password: &str) -> RegisterPayload {
        RegisterPayload {
            username: username.to_string(),
            email: email.to_string(),
            password: Secret::new(password.to_string()),
            parent_id: None,
        }
    }

    #[test]
    fn test_register_payload_validation() {
        assert!(payload("acme", "acme@example.com", "correct-horse").validate().is_ok());
        assert!(payload("ab", "acme@example.com", "correct-horse").validate().is_err());
        assert!(payload("acme", "not-an-email", "correct-horse").validate().is_err());
    }

    #[test]
    fn test_login_payload_deserializes() {
        let parsed: LoginPayload =
            serde_json::from_str(r#"{"identifier":"acme","password":"secret-pass"}"#)
                .expect("deserialize login payload");
        assert_eq!(parsed.identifier, "acme");
    }
}
