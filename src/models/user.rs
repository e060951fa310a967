use serde::{Deserialize, Serialize};

use crate::models::record::{current_timestamp, new_identifier, Record};
use crate::tokenizer::{FieldValue, IndexedField};

/// Account belonging to an organization. `username` is indexed so sign-up
/// can probe the `username:<name>` posting for emptiness before creating.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: String,
    pub org_id: String,
    pub username: String,
    pub name: String,
    pub contact: String,
    pub contact_method: String,
    /// Opaque credential digest, never indexed
    pub password_hash: String,

    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: i64,
}

static USER_INDEX: [IndexedField<User>; 5] = [
    IndexedField::equality("org_id", |u: &User| FieldValue::text(&u.org_id)),
    IndexedField::equality("username", |u: &User| FieldValue::text(&u.username)),
    IndexedField::time("created_at", |u: &User| u.created_at),
    IndexedField::time("updated_at", |u: &User| u.updated_at),
    IndexedField::time("deleted_at", |u: &User| u.deleted_at),
];

impl Record for User {
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_fields() -> &'static [IndexedField<Self>] {
        &USER_INDEX
    }
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            id: new_identifier(),
            username: username.into(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_user_tokens() {
        let mut user = User::new("ada");
        user.org_id = "org-1".to_string();
        user.password_hash = "$2b$12$abc".to_string();
        user.created_at = 86_400 * 3 + 5;
        user.updated_at = 86_400 * 3 + 5;

        let tokens: Vec<String> = tokenize(&user).iter().map(|t| t.to_string()).collect();
        assert_eq!(
            tokens,
            vec![
                "org_id:org-1",
                "username:ada",
                "created_at:259200",
                "updated_at:259200",
                "deleted_at:0",
            ]
        );
    }

    #[test]
    fn test_empty_username_is_not_indexed() {
        let user = User::new("");
        let tokens = tokenize(&user);
        assert!(!tokens.iter().any(|t| t.as_str().starts_with("username:")));
        assert!(!tokens.iter().any(|t| t.as_str().starts_with("org_id:")));
    }
}
