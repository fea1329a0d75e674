//! User directory: read access to user records in the document store.
//!
//! Writes to user records belong to the CRUD layer; this side only reads.

mod in_memory;

pub use in_memory::InMemoryUserDirectory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hrms_core::{Entity, UserId};

/// A user document as stored (role kept as the stored string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub manager_id: Option<UserId>,
}

impl Entity for UserRecord {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt user document: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;
}

#[async_trait]
impl<S> UserDirectory for Arc<S>
where
    S: UserDirectory + ?Sized,
{
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).get_user_by_id(id).await
    }
}
