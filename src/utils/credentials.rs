// src/utils/credentials.rs

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_.]*$").expect("username pattern is valid")
});

/// Letters, digits, '_' and '.', starting with a letter.
pub fn validate_username_format(username: &str) -> Result<(), ValidationError> {
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::new("invalid_username")
            .with_message("Username must start with a letter and contain only letters, digits, '_' or '.'.".into()));
    }
    Ok(())
}

/// Rough password strength from 0 (very weak) to 4 (strong).
///
/// One point for length ≥ 8, one more for length ≥ 12, and up to two points
/// for character variety (lowercase, uppercase, digits, symbols). Passwords made
/// of a single repeated character score 0.
pub fn password_strength(password: &str) -> u8 {
    let mut chars = password.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return 0,
    };
    if chars.all(|c| c == first) {
        return 0;
    }

    let len = password.chars().count();
    let mut score = 0u8;
    if len >= 8 {
        score += 1;
    }
    if len >= 12 {
        score += 1;
    }

    let classes = [
        password.chars().any(|c| c.is_lowercase()),
        password.chars().any(|c| c.is_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ]
    .iter()
    .filter(|present| **present)
    .count();

    score += match classes {
        0 | 1 => 0,
        2 => 1,
        _ => 2,
    };

    score.min(4)
}

/// Human label for a strength score.
pub fn strength_label(score: u8) -> &'static str {
    match score {
        0 => "very weak",
        1 => "weak",
        2 => "fair",
        3 => "good",
        _ => "strong",
    }
}
