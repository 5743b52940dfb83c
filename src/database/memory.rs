use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::database::models::CourseMode;
use crate::database::repository::{CourseModeStore, StoreError};

/// In-memory course mode storage for tests and local development.
///
/// Keys are (course_id, mode_slug); BTreeMap keeps listing order stable by
/// slug, matching the Postgres backend's ORDER BY.
#[derive(Default)]
pub struct MemoryCourseModeStore {
    modes: RwLock<BTreeMap<(String, String), CourseMode>>,
}

impl MemoryCourseModeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing the create path (provisioning tooling)
    pub fn seed(&self, mode: CourseMode) {
        let key = (mode.course_id.clone(), mode.mode_slug.clone());
        self.modes.write().unwrap().insert(key, mode);
    }

    /// Number of records stored under the given natural key (0 or 1)
    pub fn count(&self, course_id: &str, mode_slug: &str) -> usize {
        let key = (course_id.to_string(), mode_slug.to_string());
        usize::from(self.modes.read().unwrap().contains_key(&key))
    }
}

#[async_trait]
impl CourseModeStore for MemoryCourseModeStore {
    async fn list(&self, course_id: &str) -> Result<Vec<CourseMode>, StoreError> {
        let modes = self.modes.read().unwrap();
        Ok(modes
            .values()
            .filter(|mode| mode.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn get(&self, course_id: &str, mode_slug: &str) -> Result<Option<CourseMode>, StoreError> {
        let key = (course_id.to_string(), mode_slug.to_string());
        Ok(self.modes.read().unwrap().get(&key).cloned())
    }

    async fn create(&self, mode: &CourseMode) -> Result<(), StoreError> {
        let key = (mode.course_id.clone(), mode.mode_slug.clone());
        let mut modes = self.modes.write().unwrap();
        if modes.contains_key(&key) {
            return Err(StoreError::Duplicate(format!(
                "Course mode '{}' already exists for course '{}'",
                mode.mode_slug, mode.course_id
            )));
        }
        modes.insert(key, mode.clone());
        Ok(())
    }

    async fn update(&self, mode: &CourseMode) -> Result<(), StoreError> {
        let key = (mode.course_id.clone(), mode.mode_slug.clone());
        let mut modes = self.modes.write().unwrap();
        match modes.get_mut(&key) {
            Some(stored) => {
                *stored = mode.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "Course mode '{}' not found for course '{}'",
                mode.mode_slug, mode.course_id
            ))),
        }
    }

    async fn delete(&self, course_id: &str, mode_slug: &str) -> Result<(), StoreError> {
        let key = (course_id.to_string(), mode_slug.to_string());
        let mut modes = self.modes.write().unwrap();
        match modes.remove(&key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!(
                "Course mode '{}' not found for course '{}'",
                mode_slug, course_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(course_id: &str, slug: &str, price: i32) -> CourseMode {
        CourseMode {
            course_id: course_id.to_string(),
            mode_slug: slug.to_string(),
            mode_display_name: slug.to_string(),
            min_price: price,
            currency: "usd".to_string(),
            expiration_datetime: None,
            expiration_datetime_is_explicit: false,
            description: None,
            sku: None,
            bulk_sku: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = MemoryCourseModeStore::new();
        store.create(&mode("course-a", "audit", 0)).await.unwrap();

        let found = store.get("course-a", "audit").await.unwrap().unwrap();
        assert_eq!(found.mode_slug, "audit");
        assert_eq!(store.get("course-a", "verified").await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_duplicate_is_rejected() {
        let store = MemoryCourseModeStore::new();
        store.create(&mode("course-a", "audit", 0)).await.unwrap();

        let err = store.create(&mode("course-a", "audit", 10)).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // same slug under a different course is a distinct record
        store.create(&mode("course-b", "audit", 0)).await.unwrap();
    }

    #[tokio::test]
    async fn list_scopes_to_course_and_sorts_by_slug() {
        let store = MemoryCourseModeStore::new();
        store.create(&mode("course-a", "verified", 25)).await.unwrap();
        store.create(&mode("course-a", "audit", 0)).await.unwrap();
        store.create(&mode("course-b", "masters", 0)).await.unwrap();

        let slugs: Vec<String> = store
            .list("course-a")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.mode_slug)
            .collect();
        assert_eq!(slugs, vec!["audit", "verified"]);
    }

    #[tokio::test]
    async fn update_and_delete_miss_on_absent_key() {
        let store = MemoryCourseModeStore::new();

        let err = store.update(&mode("course-a", "audit", 0)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = store.delete("course-a", "audit").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let store = MemoryCourseModeStore::new();
        store.create(&mode("course-a", "bachelors", 1000)).await.unwrap();

        store.delete("course-a", "bachelors").await.unwrap();
        assert_eq!(store.count("course-a", "bachelors"), 0);
        assert_eq!(store.get("course-a", "bachelors").await.unwrap(), None);
    }
}
