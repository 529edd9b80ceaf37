//! /api/notes handlers. Identity is required everywhere except the
//! global public feed; the caller's user id is threaded explicitly into
//! every service call.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::config;
use crate::database::models::Note;
use crate::database::repository::{NoteSearch, Page, PageRequest, SortDir, SortKey};
use crate::error::ApiError;
use crate::middleware::Identity;
use crate::services::note_service::{NoteInput, NoteStats};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl PageQuery {
    /// Clamp to configured bounds; unknown sort names fall back to the
    /// update timestamp.
    fn to_request(&self) -> PageRequest {
        let api = &config::config().api;
        let size = self
            .size
            .unwrap_or(api.default_page_size)
            .clamp(1, api.max_page_size);

        PageRequest {
            page: self.page.unwrap_or(0),
            size,
            sort: self.sort_by.as_deref().map_or(SortKey::UpdatedAt, SortKey::parse),
            dir: self.sort_dir.as_deref().map_or(SortDir::Desc, SortDir::parse),
        }
    }
}

// Paging fields are repeated here instead of flattening `PageQuery`:
// serde's flatten buffering breaks query-string deserialization of
// non-string types.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl SearchQuery {
    fn to_request(&self) -> PageRequest {
        PageQuery {
            page: self.page,
            size: self.size,
            sort_by: self.sort_by.clone(),
            sort_dir: self.sort_dir.clone(),
        }
        .to_request()
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    /// `updated` (default) or `created`
    pub by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    pub subject: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub is_favorite: Option<bool>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<i64>,
}

/// GET /api/notes
pub async fn list(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let page = state
        .note_service
        .list(identity.user_id(), query.to_request())
        .await?;
    Ok(Json(page))
}

/// POST /api/notes
pub async fn create(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<NoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = note_input(payload)?;
    let note = state.note_service.create(identity.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes/:id
pub async fn get(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
    let note = state.note_service.get(identity.user_id(), id).await?;
    Ok(Json(note))
}

/// PUT /api/notes/:id
pub async fn update(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<i64>,
    Json(payload): Json<NoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let input = note_input(payload)?;
    let note = state
        .note_service
        .update(identity.user_id(), id, input)
        .await?;
    Ok(Json(note))
}

/// DELETE /api/notes/:id
pub async fn delete(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.note_service.delete(identity.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/notes (batch)
pub async fn delete_many(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .note_service
        .delete_many(identity.user_id(), &payload.ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/notes/:id/favorite
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .note_service
        .toggle_favorite(identity.user_id(), id)
        .await?;
    Ok(Json(note))
}

/// PUT /api/notes/:id/public
pub async fn toggle_public(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(id): Path<i64>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .note_service
        .toggle_public(identity.user_id(), id)
        .await?;
    Ok(Json(note))
}

/// GET /api/notes/search
pub async fn search(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let request = query.to_request();
    let filters = NoteSearch {
        keyword: query.keyword,
        subject: query.subject,
        category: query.category,
        is_favorite: query.is_favorite,
    };
    let page = state
        .note_service
        .search(identity.user_id(), filters, request)
        .await?;
    Ok(Json(page))
}

/// GET /api/notes/favorites
pub async fn favorites(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let page = state
        .note_service
        .list_favorites(identity.user_id(), query.to_request())
        .await?;
    Ok(Json(page))
}

/// GET /api/notes/subject/:subject
pub async fn by_subject(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(subject): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let page = state
        .note_service
        .list_by_subject(identity.user_id(), &subject, query.to_request())
        .await?;
    Ok(Json(page))
}

/// GET /api/notes/category/:category
pub async fn by_category(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(category): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let page = state
        .note_service
        .list_by_category(identity.user_id(), &category, query.to_request())
        .await?;
    Ok(Json(page))
}

/// GET /api/notes/tag/:tag
pub async fn by_tag(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Path(tag): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let page = state
        .note_service
        .list_by_tag(identity.user_id(), &tag, query.to_request())
        .await?;
    Ok(Json(page))
}

/// GET /api/notes/tags
pub async fn tags(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.note_service.tags(identity.user_id()).await?))
}

/// GET /api/notes/subjects
pub async fn subjects(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.note_service.subjects(identity.user_id()).await?))
}

/// GET /api/notes/categories
pub async fn categories(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(
        state.note_service.categories(identity.user_id()).await?,
    ))
}

/// GET /api/notes/stats
pub async fn stats(
    State(state): State<AppState>,
    Identity(identity): Identity,
) -> Result<Json<NoteStats>, ApiError> {
    Ok(Json(state.note_service.stats(identity.user_id()).await?))
}

/// GET /api/notes/recent?by=updated|created
pub async fn recent(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let limit = config::config().api.recent_notes_limit;
    let notes = match query.by.as_deref() {
        Some("created") => {
            state
                .note_service
                .recent_created(identity.user_id(), limit)
                .await?
        }
        _ => {
            state
                .note_service
                .recent_updated(identity.user_id(), limit)
                .await?
        }
    };
    Ok(Json(notes))
}

/// GET /api/notes/public - the only note listing without an identity.
pub async fn public_feed(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let page = state.note_service.list_public(query.to_request()).await?;
    Ok(Json(page))
}

/// GET /api/notes/public/mine
pub async fn own_public(
    State(state): State<AppState>,
    Identity(identity): Identity,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Note>>, ApiError> {
    let page = state
        .note_service
        .list_own_public(identity.user_id(), query.to_request())
        .await?;
    Ok(Json(page))
}

fn note_input(payload: NoteRequest) -> Result<NoteInput, ApiError> {
    let mut field_errors = HashMap::new();

    let subject = payload.subject.trim();
    if subject.is_empty() {
        field_errors.insert("subject".to_string(), "must not be blank".to_string());
    } else if subject.len() > 100 {
        field_errors.insert("subject".to_string(), "must be at most 100 characters".to_string());
    }

    let title = payload.title.trim();
    if title.is_empty() {
        field_errors.insert("title".to_string(), "must not be blank".to_string());
    } else if title.len() > 200 {
        field_errors.insert("title".to_string(), "must be at most 200 characters".to_string());
    }

    if let Some(category) = payload.category.as_deref() {
        if category.len() > 50 {
            field_errors.insert(
                "category".to_string(),
                "must be at most 50 characters".to_string(),
            );
        }
    }

    if !field_errors.is_empty() {
        return Err(ApiError::validation_error(
            "Validation failed",
            Some(field_errors),
        ));
    }

    Ok(NoteInput {
        subject: subject.to_string(),
        title: title.to_string(),
        content: payload.content,
        tags: payload.tags,
        category: payload.category.filter(|c| !c.trim().is_empty()),
        is_favorite: payload.is_favorite,
        is_public: payload.is_public,
    })
}
