//! Tags and the mapping from CATEGORIES names to stored tags.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TaskDavResult;
use crate::store::TagStore;

/// A stored tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagData {
    pub id: i64,
    pub remote_id: String,
    pub name: String,
}

impl TagData {
    pub fn new(name: &str) -> Self {
        TagData {
            id: 0,
            remote_id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
        }
    }
}

/// Look up tags for `names`, creating the ones that don't exist yet.
/// Duplicate and blank names are ignored.
pub async fn resolve_tags<S: TagStore>(store: &mut S, names: &[String]) -> TaskDavResult<Vec<TagData>> {
    let mut wanted: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !wanted.iter().any(|w| w == name) {
            wanted.push(name.to_string());
        }
    }
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let mut tags = store.tags_by_names(&wanted).await?;
    for name in &wanted {
        if !tags.iter().any(|t| &t.name == name) {
            debug!(tag = %name, "Creating tag");
            let tag = store.create_tag(name).await?;
            tags.push(tag);
        }
    }

    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_creates_only_missing_tags() {
        let mut store = MemoryStore::new();
        let existing = store.create_tag("a").await.unwrap();

        let tags = resolve_tags(&mut store, &names(&["a", "b"])).await.unwrap();

        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&existing));
        assert!(tags.iter().any(|t| t.name == "b"));
        assert_eq!(store.tags().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_one_tag() {
        let mut store = MemoryStore::new();

        let tags = resolve_tags(&mut store, &names(&["x", "x", " x "])).await.unwrap();

        assert_eq!(tags.len(), 1);
        assert_eq!(store.tags().len(), 1);
    }

    #[tokio::test]
    async fn test_no_names_creates_nothing() {
        let mut store = MemoryStore::new();

        let tags = resolve_tags(&mut store, &[]).await.unwrap();

        assert!(tags.is_empty());
        assert!(store.tags().is_empty());
    }
}
