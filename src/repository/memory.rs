use std::collections::HashMap;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Note, NoteDraft};

/// Process-local note repository used when no database is configured.
#[derive(Default)]
pub struct MemoryRepository {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    notes: HashMap<Uuid, Note>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Inner {
    /// Current time at microsecond precision, strictly after any stamp
    /// handed out before.
    fn next_stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now().trunc_subsecs(6);
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }
}

impl MemoryRepository {
    pub async fn create_note(&self, draft: &NoteDraft) -> Note {
        let mut inner = self.inner.write().await;
        let stamp = inner.next_stamp();

        let mut id = Uuid::new_v4();
        while inner.notes.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let note = Note {
            id,
            title: draft.title().to_owned(),
            content: draft.content().to_owned(),
            created_at: stamp,
            updated_at: stamp,
        };
        inner.notes.insert(id, note.clone());
        note
    }

    pub async fn update_note(&self, id: Uuid, draft: &NoteDraft) -> Option<Note> {
        let mut inner = self.inner.write().await;
        if !inner.notes.contains_key(&id) {
            return None;
        }

        let stamp = inner.next_stamp();
        let note = inner.notes.get_mut(&id)?;
        note.title = draft.title().to_owned();
        note.content = draft.content().to_owned();
        note.updated_at = stamp;
        Some(note.clone())
    }

    pub async fn delete_note(&self, id: Uuid) -> bool {
        self.inner.write().await.notes.remove(&id).is_some()
    }

    pub async fn get_one_note(&self, id: Uuid) -> Option<Note> {
        self.inner.read().await.notes.get(&id).cloned()
    }

    pub async fn get_all_notes(&self) -> Vec<Note> {
        let mut notes: Vec<Note> = self.inner.read().await.notes.values().cloned().collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: &str, content: &str) -> NoteDraft {
        NoteDraft::parse(Some(title), Some(content)).unwrap()
    }

    #[tokio::test]
    async fn create_assigns_id_and_equal_timestamps() {
        let repo = MemoryRepository::default();
        let note = repo.create_note(&draft("Shopping", "Milk, eggs")).await;

        assert_eq!(note.title, "Shopping");
        assert_eq!(note.created_at, note.updated_at);
        assert_eq!(repo.get_one_note(note.id).await, Some(note));
    }

    #[tokio::test]
    async fn update_refreshes_only_updated_at() {
        let repo = MemoryRepository::default();
        let created = repo.create_note(&draft("a", "b")).await;

        let updated = repo.update_note(created.id, &draft("c", "d")).await.unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!((updated.title.as_str(), updated.content.as_str()), ("c", "d"));
    }

    #[tokio::test]
    async fn unknown_ids_are_reported_as_absent() {
        let repo = MemoryRepository::default();
        let id = Uuid::new_v4();

        assert!(repo.get_one_note(id).await.is_none());
        assert!(repo.update_note(id, &draft("a", "b")).await.is_none());
        assert!(!repo.delete_note(id).await);
    }

    #[tokio::test]
    async fn delete_removes_note() {
        let repo = MemoryRepository::default();
        let note = repo.create_note(&draft("a", "b")).await;

        assert!(repo.delete_note(note.id).await);
        assert!(repo.get_one_note(note.id).await.is_none());
        assert!(repo.get_all_notes().await.is_empty());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = MemoryRepository::default();
        let first = repo.create_note(&draft("first", "1")).await;
        let second = repo.create_note(&draft("second", "2")).await;
        let third = repo.create_note(&draft("third", "3")).await;

        // Updating must not change the listing order.
        repo.update_note(first.id, &draft("first", "edited")).await;

        let ids: Vec<Uuid> = repo.get_all_notes().await.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);
    }

    #[test]
    fn stamps_never_repeat() {
        let mut inner = Inner::default();
        let stamps: Vec<_> = (0..1000).map(|_| inner.next_stamp()).collect();
        assert!(stamps.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
