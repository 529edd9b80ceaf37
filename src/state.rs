use sqlx::PgPool;
use std::sync::Arc;

use crate::database::pool;
use crate::database::postgres::{PgNoteRepository, PgUserRepository};
use crate::database::repository::{NoteRepository, StoreError, UserRepository};
use crate::services::{NoteService, UserService};

/// Shared application state: service handles over trait-object
/// repositories, so tests can assemble the router over in-memory storage.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub note_service: NoteService,
    /// Present when backed by Postgres; used by the health endpoint.
    pool: Option<PgPool>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserRepository>, notes: Arc<dyn NoteRepository>) -> Self {
        Self {
            user_service: UserService::new(users.clone()),
            note_service: NoteService::new(notes, users),
            pool: None,
        }
    }

    pub fn with_pool(pg: PgPool) -> Self {
        let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pg.clone()));
        let notes: Arc<dyn NoteRepository> = Arc::new(PgNoteRepository::new(pg.clone()));
        Self {
            user_service: UserService::new(users.clone()),
            note_service: NoteService::new(notes, users),
            pool: Some(pg),
        }
    }

    /// Ping the backing store, if there is one.
    pub async fn health(&self) -> Result<(), StoreError> {
        match &self.pool {
            Some(pg) => pool::health_check(pg).await,
            None => Ok(()),
        }
    }
}
