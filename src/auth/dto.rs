use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::extract::{not_blank, plain_text};

/// Request body for local signup.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(
        custom = "plain_text",
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: String,
    #[validate(email(message = "Please enter a valid email."))]
    pub email: String,
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email."))]
    pub email: String,
    #[validate(custom(function = "not_blank", message = "Password is required."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(
        custom = "plain_text",
        length(max = 100, message = "Name cannot exceed 100 characters")
    )]
    pub name: Option<String>,
    #[validate(email(message = "Please enter a valid email."))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(custom(function = "not_blank", message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 5, message = "Password must be at least 5 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Response returned after login or OAuth sign-in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub message: &'static str,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub google_linked: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<super::repo_types::User> for PublicUser {
    fn from(u: super::repo_types::User) -> Self {
        Self {
            google_linked: u.google_id.is_some(),
            id: u.id,
            name: u.name,
            email: u.email,
            is_admin: u.is_admin,
            created_at: u.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_rules() {
        let ok = SignupRequest {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "12345".into(),
        };
        assert!(ok.validate().is_ok());

        let bad = SignupRequest {
            name: "<b>Ada</b>".into(),
            email: "nope".into(),
            password: "1234".into(),
        };
        let errs = bad.validate().unwrap_err();
        let fields = errs.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn profile_update_fields_are_optional() {
        let empty = UpdateProfileRequest { name: None, email: None };
        assert!(empty.validate().is_ok());
        let blank = UpdateProfileRequest { name: Some("  ".into()), email: None };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn public_user_hides_password() {
        let user = super::super::repo_types::User {
            id: Uuid::new_v4(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: Some("$argon2id$secret".into()),
            google_id: None,
            is_admin: false,
            active_plan_id: None,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("ada@example.com"));
        assert!(json.contains("\"googleLinked\":false"));
        assert!(!json.contains("argon2"));
    }
}
