use std::collections::HashSet;
use std::sync::OnceLock;

use ammonia::Builder;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use regex::Regex;
use sha2::{Digest, Sha256};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn hash_password(argon2: &Argon2<'_>, password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(argon2: &Argon2<'_>, password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

const MAX_SANITIZE_PASSES: usize = 4;

/// Strips every HTML tag, leaving plain text with entities decoded.
///
/// Decoding can surface new markup (`&lt;b&gt;` becomes `<b>`), so cleaning
/// repeats until the text stops changing.
pub fn sanitize_text(text: &str) -> String {
    let mut builder = Builder::default();
    builder.tags(HashSet::new());

    let mut current = text.to_string();
    for _ in 0..MAX_SANITIZE_PASSES {
        let cleaned = builder.clean(&current).to_string();
        let decoded = html_escape::decode_html_entities(&cleaned).into_owned();
        if decoded == current {
            return decoded;
        }
        current = decoded;
    }
    builder.clean(&current).to_string()
}

fn email_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Regex should compile")
    })
}

pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Gravatar URL for `email` (rating `x`, `retro` fallback).
pub fn gravatar_url(email: &str, size: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{:x}?s={}&r=x&d=retro",
        hasher.finalize(),
        size
    )
}
