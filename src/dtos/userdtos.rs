// dtos/userdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::usermodel::{User, UserRole, UserStatus};

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters"),
        length(max = 64, message = "Password must not be more than 64 characters")
    )]
    pub password: String,

    pub role: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub role: UserRole,
    pub status: UserStatus,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            email: user.email.to_owned(),
            avatar: user.avatar.to_owned(),
            role: user.role,
            status: user.status,
            created_at: user.created_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

/// Reduced user shape embedded in chats and messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummaryDto {
    pub id: String,
    pub name: String,
    pub avatar: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl UserSummaryDto {
    pub fn with_status(user: &User) -> Self {
        UserSummaryDto {
            status: Some(user.status),
            ..Self::without_status(user)
        }
    }

    pub fn without_status(user: &User) -> Self {
        UserSummaryDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            avatar: user.avatar.to_owned(),
            status: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponseDto {
    pub token: String,
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    pub avatar: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UserStatusUpdateDto {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub status: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "hash".to_string(),
            avatar: String::new(),
            role: UserRole::Agent,
            status: UserStatus::Busy,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn register_requires_a_real_email_and_password() {
        let dto = RegisterUserDto {
            name: "Ana".to_string(),
            email: "not-an-email".to_string(),
            password: "123".to_string(),
            role: None,
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn register_rejects_overlong_passwords() {
        let dto = RegisterUserDto {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password: "x".repeat(65),
            role: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));

        let dto = RegisterUserDto {
            password: "x".repeat(64),
            ..dto
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn filtered_user_never_carries_the_password() {
        let json = serde_json::to_value(FilterUserDto::filter_user(&user())).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "agent");
        assert_eq!(json["status"], "busy");
    }

    #[test]
    fn summary_omits_status_when_not_requested() {
        let user = user();
        let json = serde_json::to_value(UserSummaryDto::without_status(&user)).unwrap();
        assert!(json.get("status").is_none());

        let json = serde_json::to_value(UserSummaryDto::with_status(&user)).unwrap();
        assert_eq!(json["status"], "busy");
    }

    #[test]
    fn partial_update_validates_only_present_fields() {
        assert!(UpdateUserDto::default().validate().is_ok());
        let dto = UpdateUserDto {
            email: Some("broken".to_string()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }
}
