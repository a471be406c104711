use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use validator::Validate;

use crate::validation::{validate_email_format, validate_password_strength};

/// Subscription plan as reported by `/auth/me`. Anything other than "free" is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Plan {
    Free,
    Paid(String),
}

impl Plan {
    pub fn is_free(&self) -> bool {
        matches!(self, Plan::Free)
    }
}

impl From<String> for Plan {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("free") || value.trim().is_empty() {
            Plan::Free
        } else {
            Plan::Paid(value.trim().to_lowercase())
        }
    }
}

impl From<Plan> for String {
    fn from(plan: Plan) -> Self {
        plan.to_string()
    }
}

impl Display for Plan {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Plan::Free => write!(f, "free"),
            Plan::Paid(name) => write!(f, "{}", name),
        }
    }
}

/// Current account (`GET /auth/me`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub email: String,
    pub plan: Plan,
    #[serde(default)]
    pub credits: f64,
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_email_format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body of `POST /auth/register`. New passwords must meet the complexity rules.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_email_format"))]
    pub email: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub password: String,
}

/// Body of `POST /auth/password`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(custom(function = "validate_password_strength"))]
    pub new_password: String,
}

/// `{ok: true}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    #[serde(default)]
    pub ok: bool,
}

/// `{message}` acknowledgement (registration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_decoding() {
        let account: Account = serde_json::from_value(json!({
            "email": "a@b.co", "plan": "FREE", "credits": 3
        }))
        .unwrap();
        assert!(account.plan.is_free());
        assert_eq!(account.credits, 3.0);

        let account: Account = serde_json::from_value(json!({
            "email": "a@b.co", "plan": "Pro"
        }))
        .unwrap();
        assert_eq!(account.plan, Plan::Paid("pro".to_string()));
        assert_eq!(serde_json::to_value(&account.plan).unwrap(), json!("pro"));
    }

    #[test]
    fn test_register_validation() {
        let req = RegisterRequest {
            email: "creator@example.com".to_string(),
            password: "clips4days".to_string(),
        };
        assert!(req.validate().is_ok());

        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "clips4days".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            email: "creator@example.com".to_string(),
            password: "short1".to_string(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_login_only_requires_a_password() {
        let req = LoginRequest {
            email: "creator@example.com".to_string(),
            password: "old".to_string(),
        };
        assert!(req.validate().is_ok());

        let req = LoginRequest {
            email: "creator@example.com".to_string(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_change_password_requires_current() {
        let req = ChangePasswordRequest {
            current_password: String::new(),
            new_password: "newpass123".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
