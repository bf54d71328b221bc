//! Declarative input validation for the signup and login forms.
//!
//! Checks run in field order and stop at the first violation, so the
//! resulting message always names exactly one field.

use std::sync::OnceLock;

use regex::Regex;

use crate::auth::{AuthError, AuthResult};

pub const USERNAME_MAX: usize = 20;
pub const EMAIL_MAX: usize = 64;
pub const PASSWORD_MAX: usize = 72;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex"))
}

fn violation(field: &'static str, message: impl Into<String>) -> AuthError {
    AuthError::Validation {
        field,
        message: message.into(),
    }
}

/// Validate all three signup fields, reporting the first violation.
pub fn signup(username: &str, email: &str, password: &str) -> AuthResult<()> {
    if username.is_empty() {
        return Err(violation("username", "Username is required."));
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(violation("username", "Username must be alphanumeric."));
    }
    if username.len() > USERNAME_MAX {
        return Err(violation(
            "username",
            format!("Username must be at most {USERNAME_MAX} characters."),
        ));
    }

    login_email(email)?;

    if password.is_empty() {
        return Err(violation("password", "Password is required."));
    }
    if password.len() > PASSWORD_MAX {
        return Err(violation(
            "password",
            format!("Password must be at most {PASSWORD_MAX} characters."),
        ));
    }

    Ok(())
}

/// Validate the email field alone; shared between signup and login.
pub fn login_email(email: &str) -> AuthResult<()> {
    if email.is_empty() {
        return Err(violation("email", "Email is required."));
    }
    if email.len() > EMAIL_MAX {
        return Err(violation(
            "email",
            format!("Email must be at most {EMAIL_MAX} characters."),
        ));
    }
    if !email_regex().is_match(email) {
        return Err(violation("email", "Email must look like name@example.com."));
    }
    Ok(())
}
