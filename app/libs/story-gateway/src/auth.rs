use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};

use crate::error::GatewayResult;

/// Login form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// `loginResult` object returned by `POST /login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user_id: String,
    pub name: String,
    pub token: String,
}

/// Exchanges credentials for a bearer token.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Fails with `InvalidCredentials` when the server refuses the login.
    async fn authenticate(&self, credentials: &Credentials) -> GatewayResult<String>;
}

/// Shared holder for the current bearer token.
///
/// Both execution contexts get their own gateway; handing them clones of the
/// same `TokenStore` keeps them authenticated as the same user.
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    token: Arc<RwLock<Option<String>>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(token);
        store
    }

    pub fn get(&self) -> Option<String> {
        self.token
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
    }

    pub fn clear(&self) {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_store_shared_between_clones() {
        let store = TokenStore::new();
        let clone = store.clone();
        assert!(!clone.is_authenticated());

        store.set("abc");
        assert_eq!(clone.get().as_deref(), Some("abc"));

        clone.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_login_result_shape() {
        let json = r#"{"userId":"user-yj5pc_LARC_AgK61","name":"Arif Faizin","token":"eyJhbGci"}"#;
        let result: LoginResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.user_id, "user-yj5pc_LARC_AgK61");
        assert_eq!(result.token, "eyJhbGci");
    }
}
