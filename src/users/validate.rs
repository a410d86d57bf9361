use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Field rules for the create path. Returns the first violated rule's
/// message.
pub fn validate_new_user(username: &str, email: &str, password: &str) -> Result<(), &'static str> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err("Username must be at least 3 characters long");
    }
    if !is_valid_email(email) {
        return Err("Invalid email format");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}
