use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_digest: String,
}

/// What is kept under the current-session key; never carries the digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
}

impl From<&User> for SessionUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            username: u.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("username already taken: {0}")]
    UsernameTaken(String),
    #[error("wrong username or password")]
    InvalidCredentials,
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "bad_params",
            Self::UsernameTaken(_) => "username_taken",
            Self::InvalidCredentials => "auth_failed",
        }
    }
}

pub fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn require_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(())
}

/// Returns the extended user list and the new user.
pub fn register(
    users: &[User],
    username: &str,
    password: &str,
) -> Result<(Vec<User>, User), AuthError> {
    require_credentials(username, password)?;
    if users.iter().any(|u| u.username == username) {
        return Err(AuthError::UsernameTaken(username.to_string()));
    }
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        password_digest: password_digest(password),
    };
    let mut next = users.to_vec();
    next.push(user.clone());
    Ok((next, user))
}

pub fn login<'a>(users: &'a [User], username: &str, password: &str) -> Result<&'a User, AuthError> {
    require_credentials(username, password)?;
    let digest = password_digest(password);
    users
        .iter()
        .find(|u| u.username == username && u.password_digest == digest)
        .ok_or(AuthError::InvalidCredentials)
}
