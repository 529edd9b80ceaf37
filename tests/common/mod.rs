//! Shared test harness: in-memory repositories and request helpers for
//! driving the real router in-process.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use notes_api::database::models::{Note, User};
use notes_api::database::repository::{
    NewNote, NewUser, NoteRepository, NoteSearch, NoteUpdate, Page, PageRequest, SortDir, SortKey,
    StoreResult, UserRepository,
};
use notes_api::state::AppState;

#[derive(Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
    next_id: AtomicI64,
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let row = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            display_name: user.display_name,
            avatar_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        self.users.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find_active_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id && u.is_active)
            .cloned())
    }

    async fn find_by_username_or_email(&self, ident: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == ident || u.email == ident)
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.users.lock().unwrap().iter().any(|u| u.email == email))
    }

    async fn update_profile(
        &self,
        id: i64,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.id == id && u.is_active) else {
            return Ok(None);
        };
        if let Some(name) = display_name {
            user.display_name = Some(name.to_string());
        }
        if let Some(url) = avatar_url {
            user.avatar_url = Some(url.to_string());
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_password_hash(&self, id: i64, hash: &str) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.password_hash = hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.is_active = false;
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryNoteRepository {
    notes: Mutex<Vec<Note>>,
    next_id: AtomicI64,
}

impl MemoryNoteRepository {
    fn paginate(mut rows: Vec<Note>, page: PageRequest) -> Page<Note> {
        let total = rows.len() as i64;
        rows.sort_by(|a, b| {
            let ord = match page.sort {
                SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                SortKey::Title => a.title.cmp(&b.title),
                SortKey::Subject => a.subject.cmp(&b.subject),
            };
            match page.dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });
        let start = (page.offset() as usize).min(rows.len());
        let end = (start + page.limit() as usize).min(rows.len());
        Page::new(rows[start..end].to_vec(), &page, total)
    }

    fn owned(&self, owner_id: i64) -> Vec<Note> {
        self.notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.owner_id == owner_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NoteRepository for MemoryNoteRepository {
    async fn create(&self, note: NewNote) -> StoreResult<Note> {
        let now = Utc::now();
        let row = Note {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            owner_id: note.owner_id,
            subject: note.subject,
            title: note.title,
            content: note.content,
            tags: note.tags,
            category: note.category,
            is_favorite: note.is_favorite,
            is_public: note.is_public,
            created_at: now,
            updated_at: now,
        };
        self.notes.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn find_by_owner_and_id(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        Ok(self
            .notes
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.owner_id == owner_id && n.id == note_id)
            .cloned())
    }

    async fn update_scoped(
        &self,
        owner_id: i64,
        note_id: i64,
        update: NoteUpdate,
    ) -> StoreResult<Option<Note>> {
        let mut notes = self.notes.lock().unwrap();
        let Some(note) = notes
            .iter_mut()
            .find(|n| n.owner_id == owner_id && n.id == note_id)
        else {
            return Ok(None);
        };
        note.subject = update.subject;
        note.title = update.title;
        note.content = update.content;
        note.tags = update.tags;
        note.category = update.category;
        note.is_favorite = update.is_favorite;
        if let Some(is_public) = update.is_public {
            note.is_public = is_public;
        }
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn toggle_favorite(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        let mut notes = self.notes.lock().unwrap();
        let Some(note) = notes
            .iter_mut()
            .find(|n| n.owner_id == owner_id && n.id == note_id)
        else {
            return Ok(None);
        };
        note.is_favorite = !note.is_favorite;
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn toggle_public(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        let mut notes = self.notes.lock().unwrap();
        let Some(note) = notes
            .iter_mut()
            .find(|n| n.owner_id == owner_id && n.id == note_id)
        else {
            return Ok(None);
        };
        note.is_public = !note.is_public;
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete_scoped(&self, owner_id: i64, note_id: i64) -> StoreResult<bool> {
        let mut notes = self.notes.lock().unwrap();
        let before = notes.len();
        notes.retain(|n| !(n.owner_id == owner_id && n.id == note_id));
        Ok(notes.len() < before)
    }

    async fn list_by_owner(&self, owner_id: i64, page: PageRequest) -> StoreResult<Page<Note>> {
        Ok(Self::paginate(self.owned(owner_id), page))
    }

    async fn list_by_owner_and_subject(
        &self,
        owner_id: i64,
        subject: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let rows = self
            .owned(owner_id)
            .into_iter()
            .filter(|n| n.subject == subject)
            .collect();
        Ok(Self::paginate(rows, page))
    }

    async fn list_by_owner_and_category(
        &self,
        owner_id: i64,
        category: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let rows = self
            .owned(owner_id)
            .into_iter()
            .filter(|n| n.category.as_deref() == Some(category))
            .collect();
        Ok(Self::paginate(rows, page))
    }

    async fn list_by_owner_and_tag(
        &self,
        owner_id: i64,
        tag: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let rows = self
            .owned(owner_id)
            .into_iter()
            .filter(|n| n.tags.iter().any(|t| t == tag))
            .collect();
        Ok(Self::paginate(rows, page))
    }

    async fn list_favorites(&self, owner_id: i64, page: PageRequest) -> StoreResult<Page<Note>> {
        let rows = self
            .owned(owner_id)
            .into_iter()
            .filter(|n| n.is_favorite)
            .collect();
        Ok(Self::paginate(rows, page))
    }

    async fn search(
        &self,
        owner_id: i64,
        search: NoteSearch,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let keyword = search.keyword.map(|k| k.to_lowercase());
        let rows = self
            .owned(owner_id)
            .into_iter()
            .filter(|n| {
                keyword.as_deref().map_or(true, |k| {
                    n.title.to_lowercase().contains(k) || n.content.to_lowercase().contains(k)
                }) && search.subject.as_deref().map_or(true, |s| n.subject == s)
                    && search
                        .category
                        .as_deref()
                        .map_or(true, |c| n.category.as_deref() == Some(c))
                    && search.is_favorite.map_or(true, |f| n.is_favorite == f)
            })
            .collect();
        Ok(Self::paginate(rows, page))
    }

    async fn tags_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>> {
        let mut tags: Vec<String> = self
            .owned(owner_id)
            .into_iter()
            .flat_map(|n| n.tags)
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn subjects_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>> {
        let mut subjects: Vec<String> =
            self.owned(owner_id).into_iter().map(|n| n.subject).collect();
        subjects.sort();
        subjects.dedup();
        Ok(subjects)
    }

    async fn categories_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>> {
        let mut categories: Vec<String> = self
            .owned(owner_id)
            .into_iter()
            .filter_map(|n| n.category)
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn count_by_owner(&self, owner_id: i64) -> StoreResult<i64> {
        Ok(self.owned(owner_id).len() as i64)
    }

    async fn count_favorites_by_owner(&self, owner_id: i64) -> StoreResult<i64> {
        Ok(self.owned(owner_id).iter().filter(|n| n.is_favorite).count() as i64)
    }

    async fn recent_updated(&self, owner_id: i64, limit: i64) -> StoreResult<Vec<Note>> {
        let mut rows = self.owned(owner_id);
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn recent_created(&self, owner_id: i64, limit: i64) -> StoreResult<Vec<Note>> {
        let mut rows = self.owned(owner_id);
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn list_public(&self, page: PageRequest) -> StoreResult<Page<Note>> {
        let rows = self
            .notes
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.is_public)
            .cloned()
            .collect();
        Ok(Self::paginate(rows, page))
    }

    async fn list_public_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let rows = self
            .owned(owner_id)
            .into_iter()
            .filter(|n| n.is_public)
            .collect();
        Ok(Self::paginate(rows, page))
    }
}

/// Fresh router over empty in-memory storage.
pub fn test_app() -> Router {
    let users = Arc::new(MemoryUserRepository::default());
    let notes = Arc::new(MemoryNoteRepository::default());
    notes_api::app(AppState::new(users, notes))
}

/// Drive one request through the router and decode the JSON body
/// (Null for empty bodies).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

/// Register an account and return (token, user_id).
pub async fn register(app: &Router, username: &str, email: &str, password: &str) -> Result<String> {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": username, "email": email, "password": password})),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {body}");
    Ok(body["token"].as_str().unwrap().to_string())
}

/// Create a note and return its JSON representation.
pub async fn create_note(app: &Router, token: &str, subject: &str, title: &str) -> Result<Value> {
    let (status, body) = send(
        app,
        "POST",
        "/api/notes",
        Some(token),
        Some(json!({"subject": subject, "title": title, "content": "c"})),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create note failed: {body}");
    Ok(body)
}
