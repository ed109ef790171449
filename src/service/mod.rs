use crate::{
    dto::{NoteRequest, NoteResponse},
    models::{NoteDraft, ValidationError, parse_note_id},
    repository::{NoteStore, StoreError},
};

use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum NoteServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Note not found")]
    NotFound,

    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Clone)]
pub struct NoteService {
    repo: Arc<NoteStore>,
}

impl NoteService {
    pub const fn new(repo: Arc<NoteStore>) -> Self {
        Self { repo }
    }

    pub async fn create_note(
        &self,
        request: NoteRequest,
    ) -> Result<NoteResponse, NoteServiceError> {
        let draft = draft_from(&request)?;
        let note = self.repo.create(&draft).await?;

        tracing::debug!("created note {}", note.id);
        Ok(note.into())
    }

    pub async fn update_note(
        &self,
        id: &str,
        request: NoteRequest,
    ) -> Result<NoteResponse, NoteServiceError> {
        let id = parse_note_id(id)?;
        let draft = draft_from(&request)?;

        self.repo
            .update(id, &draft)
            .await?
            .map(NoteResponse::from)
            .ok_or(NoteServiceError::NotFound)
    }

    pub async fn delete_note(&self, id: &str) -> Result<(), NoteServiceError> {
        let id = parse_note_id(id)?;

        if self.repo.delete(id).await? {
            tracing::debug!("deleted note {id}");
            Ok(())
        } else {
            Err(NoteServiceError::NotFound)
        }
    }

    pub async fn get_note(&self, id: &str) -> Result<NoteResponse, NoteServiceError> {
        let id = parse_note_id(id)?;

        self.repo
            .find_by_id(id)
            .await?
            .map(NoteResponse::from)
            .ok_or(NoteServiceError::NotFound)
    }

    pub async fn list_notes(&self) -> Result<Vec<NoteResponse>, NoteServiceError> {
        let notes = self.repo.find_all().await?;
        Ok(notes.into_iter().map(NoteResponse::from).collect())
    }
}

fn draft_from(request: &NoteRequest) -> Result<NoteDraft, ValidationError> {
    NoteDraft::parse(request.title.as_deref(), request.content.as_deref())
}
