use crate::db::{DbActorHandle, DbUser, Fields, Record, SelectQuery};
use crate::error::PorticoError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde_json::Value;
use tracing::info;

pub const USERS_TABLE: &str = "users";

/// Looks a user up by id.
pub async fn get_user(db: &DbActorHandle, id: i64) -> Result<Option<DbUser>, PorticoError> {
    let query = SelectQuery::new().filter("id", id).limit("1");
    db.select_one(USERS_TABLE, query)
        .await?
        .map(user_from_record)
        .transpose()
}

/// Every user, oldest first.
pub async fn list_users(db: &DbActorHandle) -> Result<Vec<DbUser>, PorticoError> {
    let query = SelectQuery::new().order_by("id ASC");
    db.select_all(USERS_TABLE, query)
        .await?
        .into_iter()
        .map(user_from_record)
        .collect()
}

/// Hashes `password` and inserts the account. Returns the new id.
pub async fn create_user(
    db: &DbActorHandle,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, PorticoError> {
    let password = password.to_string();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PorticoError::UnexpectedError(format!("password hash task failed: {e}")))??;

    let data = Fields::new()
        .with("username", username)
        .with("email", email)
        .with("password", hash);
    let id = db.insert(USERS_TABLE, data).await?;
    info!(id, username, "user created");
    Ok(id)
}

/// argon2id with a random salt, as a PHC string.
pub fn hash_password(password: &str) -> Result<String, PorticoError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PorticoError::PasswordHash(e.to_string()))
}

impl DbUser {
    /// False for a wrong password or an unparsable stored hash.
    pub fn verify_password(&self, candidate: &str) -> bool {
        PasswordHash::new(&self.password).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

fn user_from_record(record: Record) -> Result<DbUser, PorticoError> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(hash.starts_with("$argon2"));

        let user = DbUser {
            id: 1,
            username: "a".to_string(),
            email: "b@x.com".to_string(),
            password: hash,
            role: "user".to_string(),
            created_at: Utc::now(),
        };
        assert!(user.verify_password("hunter2"));
        assert!(!user.verify_password("hunter3"));
    }

    #[test]
    fn password_is_never_serialized() {
        let user = DbUser {
            id: 7,
            username: "a".to_string(),
            email: "b@x.com".to_string(),
            password: "secret-hash".to_string(),
            role: "admin".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).expect("serialize");
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
    }
}
