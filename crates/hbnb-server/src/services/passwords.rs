//! Password hashing for user accounts

use crate::error::{ApiError, ApiResult};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use hbnb_core::Entity;
use rand::rngs::OsRng;
use serde_json::{Map, Value};

/// Hash a plaintext password into a PHC string
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Replace the plaintext password just taken from `payload` with its hash.
///
/// No-op for other kinds, or when the payload carries no password.
pub fn seal_password(entity: &mut Entity, payload: &Map<String, Value>) -> ApiResult<()> {
    if let Entity::User(user) = entity {
        if payload.contains_key("password") {
            user.password = hash_password(&user.password)?;
        }
    }
    Ok(())
}
