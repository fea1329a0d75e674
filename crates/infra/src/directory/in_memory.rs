use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;

use hrms_core::{Entity, UserId};

use super::{StoreError, UserDirectory, UserRecord};

/// In-memory user directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    inner: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let dir = Self::new();
        for record in records {
            dir.upsert(record);
        }
        dir
    }

    /// Seed from a JSON array of user documents.
    pub fn load_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        let records: Vec<UserRecord> =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tracing::info!(count = records.len(), path = %path.display(), "loaded user directory");
        Ok(Self::from_records(records))
    }

    pub fn upsert(&self, record: UserRecord) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(record.id().clone(), record);
        }
    }

    /// Deprovision an account.
    pub fn remove(&self, id: &UserId) -> Option<UserRecord> {
        self.inner.write().ok()?.remove(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn get_user_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(map.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, role: &str) -> UserRecord {
        UserRecord {
            id: UserId::new(id).unwrap(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            role: role.to_string(),
            department: None,
            manager_id: None,
        }
    }

    #[tokio::test]
    async fn get_upsert_remove() {
        let dir = InMemoryUserDirectory::from_records([record("u1", "admin")]);
        let u1 = UserId::new("u1").unwrap();

        assert_eq!(dir.get_user_by_id(&u1).await.unwrap().unwrap().role, "admin");

        dir.upsert(record("u1", "employee"));
        assert_eq!(dir.get_user_by_id(&u1).await.unwrap().unwrap().role, "employee");

        dir.remove(&u1);
        assert_eq!(dir.get_user_by_id(&u1).await.unwrap(), None);
        assert!(dir.is_empty());
    }

    #[test]
    fn documents_use_camel_case_fields() {
        let json = r#"[{"id":"m1","name":"Mia","email":"mia@example.com","role":"manager","department":"Sales","managerId":"a1"}]"#;
        let records: Vec<UserRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].manager_id.as_ref().unwrap().as_str(), "a1");
    }

    #[test]
    fn missing_seed_file_is_reported() {
        let err = InMemoryUserDirectory::load_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
