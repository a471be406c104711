//! Validation modules

pub mod credentials;

pub use credentials::{
    validate_email_format, validate_password_strength, validate_required, MIN_PASSWORD_LENGTH,
};
