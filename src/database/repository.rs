//! Repository contracts for the account and note stores.
//!
//! Every note query that is not an explicit public read is parameterized
//! by the owning user id; a lookup by note id alone does not exist, so
//! cross-user access cannot be expressed at this layer at all.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::database::models::{Note, User};

/// Errors from a storage backend. Absence is expressed with `Option`
/// in the individual method signatures, not as an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sortable note columns. A closed set so ORDER BY clauses never see
/// caller-supplied identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    UpdatedAt,
    CreatedAt,
    Title,
    Subject,
}

impl SortKey {
    /// Parse a client sort name (camelCase or snake_case); unknown names
    /// fall back to the update timestamp.
    pub fn parse(s: &str) -> Self {
        match s {
            "createdAt" | "created_at" => SortKey::CreatedAt,
            "title" => SortKey::Title,
            "subject" => SortKey::Subject,
            _ => SortKey::UpdatedAt,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            SortKey::UpdatedAt => "updated_at",
            SortKey::CreatedAt => "created_at",
            SortKey::Title => "title",
            SortKey::Subject => "subject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            SortDir::Asc
        } else {
            SortDir::Desc
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// Offset + limit + sort, the only pagination this API offers.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: SortKey,
    pub dir: SortDir,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: SortKey::UpdatedAt,
            dir: SortDir::Desc,
        }
    }

    pub fn offset(&self) -> i64 {
        self.page as i64 * self.size as i64
    }

    pub fn limit(&self) -> i64 {
        self.size as i64
    }
}

/// One page of results plus totals, mirroring the wire shape clients expect.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.size.max(1);
        let total_pages = (total_elements + size as i64 - 1) / size as i64;
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }
}

/// Fields for a new account row. The digest is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Fields for a new note row; the owner is stamped by the service.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: i64,
    pub subject: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub is_favorite: bool,
    pub is_public: bool,
}

/// Full-field note update. `is_public` is optional: only an explicit
/// value changes the sharing state.
#[derive(Debug, Clone)]
pub struct NoteUpdate {
    pub subject: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub is_favorite: bool,
    pub is_public: Option<bool>,
}

/// Optional search filters, all combined with AND.
#[derive(Debug, Clone, Default)]
pub struct NoteSearch {
    pub keyword: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    /// Active-account lookup; the auth path only ever uses this.
    async fn find_active_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    /// Login lookup by username or email. Active status is checked by the
    /// caller so the failure is indistinguishable from a bad password.
    async fn find_by_username_or_email(&self, ident: &str) -> StoreResult<Option<User>>;

    async fn username_exists(&self, username: &str) -> StoreResult<bool>;
    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Partial profile update scoped to active accounts. `None` fields
    /// keep their stored value. Returns the updated row, or `None` when
    /// there is no active account with that id.
    async fn update_profile(
        &self,
        id: i64,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> StoreResult<Option<User>>;

    async fn set_password_hash(&self, id: i64, hash: &str) -> StoreResult<()>;
    async fn touch_last_login(&self, id: i64) -> StoreResult<()>;

    /// Soft delete: accounts are deactivated, never removed.
    async fn deactivate(&self, id: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn create(&self, note: NewNote) -> StoreResult<Note>;

    /// The only single-note lookup: scoped by (id, owner).
    async fn find_by_owner_and_id(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>>;

    /// Full update scoped by (id, owner); refreshes `updated_at`.
    /// `None` means no note with that id belongs to the owner.
    async fn update_scoped(
        &self,
        owner_id: i64,
        note_id: i64,
        update: NoteUpdate,
    ) -> StoreResult<Option<Note>>;

    /// Atomic flips, scoped by (id, owner).
    async fn toggle_favorite(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>>;
    async fn toggle_public(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>>;

    /// Returns whether a row was deleted.
    async fn delete_scoped(&self, owner_id: i64, note_id: i64) -> StoreResult<bool>;

    async fn list_by_owner(&self, owner_id: i64, page: PageRequest) -> StoreResult<Page<Note>>;
    async fn list_by_owner_and_subject(
        &self,
        owner_id: i64,
        subject: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>>;
    async fn list_by_owner_and_category(
        &self,
        owner_id: i64,
        category: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>>;
    async fn list_by_owner_and_tag(
        &self,
        owner_id: i64,
        tag: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>>;
    async fn list_favorites(&self, owner_id: i64, page: PageRequest) -> StoreResult<Page<Note>>;

    async fn search(
        &self,
        owner_id: i64,
        search: NoteSearch,
        page: PageRequest,
    ) -> StoreResult<Page<Note>>;

    async fn tags_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>>;
    async fn subjects_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>>;
    async fn categories_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>>;

    async fn count_by_owner(&self, owner_id: i64) -> StoreResult<i64>;
    async fn count_favorites_by_owner(&self, owner_id: i64) -> StoreResult<i64>;

    async fn recent_updated(&self, owner_id: i64, limit: i64) -> StoreResult<Vec<Note>>;
    async fn recent_created(&self, owner_id: i64, limit: i64) -> StoreResult<Vec<Note>>;

    /// Public feed: the only queries without an owner filter; they
    /// require `is_public` instead.
    async fn list_public(&self, page: PageRequest) -> StoreResult<Page<Note>>;
    async fn list_public_by_owner(&self, owner_id: i64, page: PageRequest)
        -> StoreResult<Page<Note>>;
}
