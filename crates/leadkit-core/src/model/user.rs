use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::EntityId;

/// The logged-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Bearer token plus the identity it belongs to. Created on login or
/// signup, destroyed on logout.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: SecretString,
    pub user: User,
}
