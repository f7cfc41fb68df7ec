use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::RegisterRequest;

/// Normalized registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[0-9A-Za-z_]+([.-]?[0-9A-Za-z_]+)*@[0-9A-Za-z_]+([.-]?[0-9A-Za-z_]+)*(\.[0-9A-Za-z_]{2,3})+$")
                .unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 6 {
        return Err("Password must be at least 6 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    Ok(())
}

pub fn validate_registration(req: RegisterRequest) -> Result<Registration, &'static str> {
    let name = req.name.trim();
    let email = normalize_email(&req.email);
    if name.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err("All fields are required");
    }
    if name.chars().count() < 2 {
        return Err("Name must be at least 2 characters long");
    }
    if name.chars().count() > 100 {
        return Err("Name must be at most 100 characters long");
    }
    if !is_valid_email(&email) {
        return Err("Please provide a valid email address");
    }
    check_password(&req.password)?;

    Ok(Registration {
        name: name.to_string(),
        email,
        password: req.password,
    })
}
