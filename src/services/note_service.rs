//! Note service: every operation is parameterized by the caller's user
//! id and resolved through owner-scoped repository calls. A note another
//! user owns is indistinguishable from a note that does not exist.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::Note;
use crate::database::repository::{
    NewNote, NoteRepository, NoteSearch, NoteUpdate, Page, PageRequest, StoreError, UserRepository,
};

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("note not found")]
    NotFound,
    #[error("user not found or inactive")]
    Unauthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for create and update, already validated at the handler.
#[derive(Debug, Clone)]
pub struct NoteInput {
    pub subject: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteStats {
    pub total_notes: i64,
    pub favorite_notes: i64,
    pub total_subjects: usize,
    pub total_categories: usize,
}

#[derive(Clone)]
pub struct NoteService {
    notes: Arc<dyn NoteRepository>,
    users: Arc<dyn UserRepository>,
}

impl NoteService {
    pub fn new(notes: Arc<dyn NoteRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { notes, users }
    }

    /// Every owner-scoped operation starts here: a caller that does not
    /// resolve to an active account gets Unauthorized before any note
    /// data is touched.
    async fn validate_user(&self, user_id: i64) -> Result<(), NoteError> {
        self.users
            .find_active_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or(NoteError::Unauthorized)
    }

    pub async fn list(&self, user_id: i64, page: PageRequest) -> Result<Page<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.list_by_owner(user_id, page).await?)
    }

    pub async fn get(&self, user_id: i64, note_id: i64) -> Result<Note, NoteError> {
        self.validate_user(user_id).await?;
        self.notes
            .find_by_owner_and_id(user_id, note_id)
            .await?
            .ok_or(NoteError::NotFound)
    }

    pub async fn create(&self, user_id: i64, input: NoteInput) -> Result<Note, NoteError> {
        self.validate_user(user_id).await?;
        let note = self
            .notes
            .create(NewNote {
                owner_id: user_id,
                subject: input.subject,
                title: input.title,
                content: input.content,
                tags: normalize_tags(input.tags),
                category: input.category,
                is_favorite: input.is_favorite.unwrap_or(false),
                is_public: input.is_public.unwrap_or(false),
            })
            .await?;
        Ok(note)
    }

    /// Full update. Omitting `isPublic` leaves the sharing state alone;
    /// everything else is replaced.
    pub async fn update(
        &self,
        user_id: i64,
        note_id: i64,
        input: NoteInput,
    ) -> Result<Note, NoteError> {
        self.validate_user(user_id).await?;
        self.notes
            .update_scoped(
                user_id,
                note_id,
                NoteUpdate {
                    subject: input.subject,
                    title: input.title,
                    content: input.content,
                    tags: normalize_tags(input.tags),
                    category: input.category,
                    is_favorite: input.is_favorite.unwrap_or(false),
                    is_public: input.is_public,
                },
            )
            .await?
            .ok_or(NoteError::NotFound)
    }

    pub async fn toggle_favorite(&self, user_id: i64, note_id: i64) -> Result<Note, NoteError> {
        self.validate_user(user_id).await?;
        self.notes
            .toggle_favorite(user_id, note_id)
            .await?
            .ok_or(NoteError::NotFound)
    }

    pub async fn toggle_public(&self, user_id: i64, note_id: i64) -> Result<Note, NoteError> {
        self.validate_user(user_id).await?;
        self.notes
            .toggle_public(user_id, note_id)
            .await?
            .ok_or(NoteError::NotFound)
    }

    pub async fn delete(&self, user_id: i64, note_id: i64) -> Result<(), NoteError> {
        self.validate_user(user_id).await?;
        if self.notes.delete_scoped(user_id, note_id).await? {
            Ok(())
        } else {
            Err(NoteError::NotFound)
        }
    }

    /// Batch delete. Ids the caller does not own are skipped silently, so
    /// the operation leaks nothing about other users' notes.
    pub async fn delete_many(&self, user_id: i64, note_ids: &[i64]) -> Result<(), NoteError> {
        self.validate_user(user_id).await?;
        for &note_id in note_ids {
            self.notes.delete_scoped(user_id, note_id).await?;
        }
        Ok(())
    }

    pub async fn list_by_subject(
        &self,
        user_id: i64,
        subject: &str,
        page: PageRequest,
    ) -> Result<Page<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self
            .notes
            .list_by_owner_and_subject(user_id, subject, page)
            .await?)
    }

    pub async fn list_by_category(
        &self,
        user_id: i64,
        category: &str,
        page: PageRequest,
    ) -> Result<Page<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self
            .notes
            .list_by_owner_and_category(user_id, category, page)
            .await?)
    }

    pub async fn list_by_tag(
        &self,
        user_id: i64,
        tag: &str,
        page: PageRequest,
    ) -> Result<Page<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.list_by_owner_and_tag(user_id, tag, page).await?)
    }

    pub async fn list_favorites(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.list_favorites(user_id, page).await?)
    }

    pub async fn search(
        &self,
        user_id: i64,
        search: NoteSearch,
        page: PageRequest,
    ) -> Result<Page<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.search(user_id, search, page).await?)
    }

    pub async fn tags(&self, user_id: i64) -> Result<Vec<String>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.tags_for_owner(user_id).await?)
    }

    pub async fn subjects(&self, user_id: i64) -> Result<Vec<String>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.subjects_for_owner(user_id).await?)
    }

    pub async fn categories(&self, user_id: i64) -> Result<Vec<String>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.categories_for_owner(user_id).await?)
    }

    pub async fn stats(&self, user_id: i64) -> Result<NoteStats, NoteError> {
        self.validate_user(user_id).await?;
        let total_notes = self.notes.count_by_owner(user_id).await?;
        let favorite_notes = self.notes.count_favorites_by_owner(user_id).await?;
        let subjects = self.notes.subjects_for_owner(user_id).await?;
        let categories = self.notes.categories_for_owner(user_id).await?;

        Ok(NoteStats {
            total_notes,
            favorite_notes,
            total_subjects: subjects.len(),
            total_categories: categories.len(),
        })
    }

    pub async fn recent_updated(&self, user_id: i64, limit: i64) -> Result<Vec<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.recent_updated(user_id, limit).await?)
    }

    pub async fn recent_created(&self, user_id: i64, limit: i64) -> Result<Vec<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.recent_created(user_id, limit).await?)
    }

    /// Global public feed. No identity and no owner filter; visibility
    /// comes from the public flag alone.
    pub async fn list_public(&self, page: PageRequest) -> Result<Page<Note>, NoteError> {
        Ok(self.notes.list_public(page).await?)
    }

    pub async fn list_own_public(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Note>, NoteError> {
        self.validate_user(user_id).await?;
        Ok(self.notes.list_public_by_owner(user_id, page).await?)
    }
}

/// Tags are an unordered unique set on the wire; store them sorted and
/// deduplicated.
fn normalize_tags(mut tags: Vec<String>) -> Vec<String> {
    for tag in &mut tags {
        *tag = tag.trim().to_string();
    }
    tags.retain(|tag| !tag.is_empty());
    tags.sort();
    tags.dedup();
    tags
}
