use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::draft::MealDraft;
use crate::storage::is_photo_key;

const DEFAULT_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

struct Entry {
    draft: MealDraft,
    touched_at: Instant,
    /// Uploaded photo keys already referenced by a saved meal.
    saved_photos: HashSet<String>,
}

/// Result of an edit: the new draft, plus an uploaded photo key that no
/// saved meal or the draft itself points to anymore.
#[derive(Debug)]
pub struct DraftUpdate {
    pub draft: MealDraft,
    pub released_photo: Option<String>,
}

/// Open drafts, one per input session. Drafts idle for longer than the
/// configured time are dropped the next time the store is used.
#[derive(Clone)]
pub struct DraftStore {
    inner: Arc<RwLock<HashMap<Uuid, Entry>>>,
    idle: Duration,
}

impl Default for DraftStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE)
    }
}

impl DraftStore {
    pub fn with_idle_timeout(idle: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle,
        }
    }

    fn evict_idle(&self, drafts: &mut HashMap<Uuid, Entry>, now: Instant) {
        let before = drafts.len();
        drafts.retain(|_, e| now.duration_since(e.touched_at) < self.idle);
        let evicted = before - drafts.len();
        if evicted > 0 {
            debug!(evicted, "idle drafts dropped");
        }
    }

    pub async fn open(&self) -> (Uuid, MealDraft) {
        let now = Instant::now();
        let mut drafts = self.inner.write().await;
        self.evict_idle(&mut drafts, now);

        let id = Uuid::new_v4();
        let draft = MealDraft::default();
        drafts.insert(
            id,
            Entry {
                draft: draft.clone(),
                touched_at: now,
                saved_photos: HashSet::new(),
            },
        );
        (id, draft)
    }

    pub async fn get(&self, id: Uuid) -> Option<MealDraft> {
        let now = Instant::now();
        let mut drafts = self.inner.write().await;
        self.evict_idle(&mut drafts, now);
        let entry = drafts.get_mut(&id)?;
        entry.touched_at = now;
        Some(entry.draft.clone())
    }

    /// Replaces the draft with `f(draft)`.
    pub async fn update<F>(&self, id: Uuid, f: F) -> Option<DraftUpdate>
    where
        F: FnOnce(MealDraft) -> MealDraft,
    {
        let now = Instant::now();
        let mut drafts = self.inner.write().await;
        self.evict_idle(&mut drafts, now);
        let entry = drafts.get_mut(&id)?;

        let previous = entry.draft.image_uri.clone();
        entry.draft = f(std::mem::take(&mut entry.draft));
        entry.touched_at = now;

        let released_photo = previous.filter(|uri| {
            is_photo_key(uri)
                && entry.draft.image_uri.as_ref() != Some(uri)
                && !entry.saved_photos.contains(uri)
        });
        Some(DraftUpdate {
            draft: entry.draft.clone(),
            released_photo,
        })
    }

    /// Returns the draft for saving and pins its photo so later edits keep it.
    pub async fn take_for_save(&self, id: Uuid) -> Option<MealDraft> {
        let now = Instant::now();
        let mut drafts = self.inner.write().await;
        self.evict_idle(&mut drafts, now);
        let entry = drafts.get_mut(&id)?;
        entry.touched_at = now;
        if let Some(uri) = &entry.draft.image_uri {
            entry.saved_photos.insert(uri.clone());
        }
        Some(entry.draft.clone())
    }

    pub async fn discard(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_update_discard() {
        let store = DraftStore::default();
        let (id, draft) = store.open().await;
        assert_eq!(draft, MealDraft::default());

        let updated = store
            .update(id, |d| d.with_food_name("rice"))
            .await
            .unwrap();
        assert_eq!(updated.draft.food_name, "rice");
        assert!(updated.released_photo.is_none());
        assert_eq!(store.get(id).await, Some(updated.draft));

        assert!(store.discard(id).await);
        assert!(!store.discard(id).await);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn update_unknown_draft_is_none() {
        let store = DraftStore::default();
        assert!(store.update(Uuid::new_v4(), |d| d).await.is_none());
    }

    #[tokio::test]
    async fn clones_share_drafts() {
        let store = DraftStore::default();
        let (id, _) = store.open().await;
        let other = store.clone();
        other.update(id, |d| d.with_cost("1200")).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().cost, 1200);
    }

    #[tokio::test]
    async fn idle_drafts_are_evicted() {
        let store = DraftStore::with_idle_timeout(Duration::from_millis(50));
        let (stale, _) = store.open().await;
        tokio::time::sleep(Duration::from_millis(80)).await;

        let (fresh, _) = store.open().await;
        assert_eq!(store.len().await, 1);
        assert!(store.get(stale).await.is_none());
        assert!(store.get(fresh).await.is_some());
    }

    #[tokio::test]
    async fn touching_a_draft_keeps_it_alive() {
        let store = DraftStore::with_idle_timeout(Duration::from_millis(150));
        let (id, _) = store.open().await;
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(60)).await;
            assert!(store.get(id).await.is_some());
        }
    }

    #[tokio::test]
    async fn replacing_an_uploaded_photo_releases_it() {
        let store = DraftStore::default();
        let (id, _) = store.open().await;
        store
            .update(id, |d| d.with_image_uri("meals/d/first.jpg"))
            .await
            .unwrap();

        let next = store
            .update(id, |d| d.with_image_uri("meals/d/second.jpg"))
            .await
            .unwrap();
        assert_eq!(next.released_photo.as_deref(), Some("meals/d/first.jpg"));

        // external references are never released
        store
            .update(id, |d| d.with_image_uri("https://img.example/a.jpg"))
            .await
            .unwrap();
        let next = store
            .update(id, |d| d.with_image_uri("https://img.example/b.jpg"))
            .await
            .unwrap();
        assert!(next.released_photo.is_none());
    }

    #[tokio::test]
    async fn saved_photos_are_not_released() {
        let store = DraftStore::default();
        let (id, _) = store.open().await;
        store
            .update(id, |d| d.with_image_uri("meals/d/first.jpg"))
            .await
            .unwrap();
        store.take_for_save(id).await.unwrap();

        let next = store
            .update(id, |d| d.with_image_uri("meals/d/second.jpg"))
            .await
            .unwrap();
        assert!(next.released_photo.is_none());
    }
}
