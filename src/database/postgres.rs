//! Postgres-backed repositories.
//!
//! All statements are runtime-bound parameterized queries. The only
//! dynamic SQL fragment is the ORDER BY clause, which is rendered from
//! the closed `SortKey`/`SortDir` enums, never from request input.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::models::{Note, User};
use crate::database::repository::{
    NewNote, NewUser, NoteRepository, NoteSearch, NoteUpdate, Page, PageRequest, StoreResult,
    UserRepository,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, display_name, avatar_url, \
     is_active, created_at, updated_at, last_login_at";

const NOTE_COLUMNS: &str = "id, owner_id, subject, title, content, tags, category, \
     is_favorite, is_public, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, display_name) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.display_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_active_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_username_or_email(&self, ident: &str) -> StoreResult<Option<User>> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(ident)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn username_exists(&self, username: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update_profile(
        &self,
        id: i64,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
                display_name = COALESCE($2, display_name), \
                avatar_url = COALESCE($3, avatar_url), \
                updated_at = now() \
             WHERE id = $1 AND is_active \
             RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(display_name)
            .bind(avatar_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_password_hash(&self, id: i64, hash: &str) -> StoreResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> StoreResult<()> {
        sqlx::query("UPDATE users SET is_active = FALSE, updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

pub struct PgNoteRepository {
    pool: PgPool,
}

/// A positional bind value for the shared count/select page queries.
#[derive(Debug, Clone)]
enum Bind {
    I64(i64),
    Text(String),
    OptText(Option<String>),
    OptBool(Option<bool>),
}

type PgQueryAs<'q, T> = sqlx::query::QueryAs<'q, sqlx::Postgres, T, sqlx::postgres::PgArguments>;
type PgQueryScalar<'q, T> =
    sqlx::query::QueryScalar<'q, sqlx::Postgres, T, sqlx::postgres::PgArguments>;

fn bind_as<'q>(query: PgQueryAs<'q, Note>, value: &Bind) -> PgQueryAs<'q, Note> {
    match value {
        Bind::I64(v) => query.bind(*v),
        Bind::Text(v) => query.bind(v.clone()),
        Bind::OptText(v) => query.bind(v.clone()),
        Bind::OptBool(v) => query.bind(*v),
    }
}

fn bind_scalar<'q>(query: PgQueryScalar<'q, i64>, value: &Bind) -> PgQueryScalar<'q, i64> {
    match value {
        Bind::I64(v) => query.bind(*v),
        Bind::Text(v) => query.bind(v.clone()),
        Bind::OptText(v) => query.bind(v.clone()),
        Bind::OptBool(v) => query.bind(*v),
    }
}

impl PgNoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a count + page select over the same WHERE clause with the same
    /// positional binds. LIMIT/OFFSET are integers computed server-side
    /// and ORDER BY is rendered from closed enums.
    async fn fetch_page(
        &self,
        where_clause: &str,
        binds: Vec<Bind>,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let count_sql = format!("SELECT COUNT(*) FROM notes WHERE {where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = bind_scalar(count_query, value);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        let select_sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE {where_clause} \
             ORDER BY {} {} LIMIT {} OFFSET {}",
            page.sort.column(),
            page.dir.keyword(),
            page.limit(),
            page.offset(),
        );
        let mut select_query = sqlx::query_as::<_, Note>(&select_sql);
        for value in &binds {
            select_query = bind_as(select_query, value);
        }
        let rows = select_query.fetch_all(&self.pool).await?;

        Ok(Page::new(rows, &page, total))
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, note: NewNote) -> StoreResult<Note> {
        let sql = format!(
            "INSERT INTO notes (owner_id, subject, title, content, tags, category, \
                                is_favorite, is_public) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Note>(&sql)
            .bind(note.owner_id)
            .bind(&note.subject)
            .bind(&note.title)
            .bind(&note.content)
            .bind(&note.tags)
            .bind(&note.category)
            .bind(note.is_favorite)
            .bind(note.is_public)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_owner_and_id(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = $1 AND id = $2");
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_scoped(
        &self,
        owner_id: i64,
        note_id: i64,
        update: NoteUpdate,
    ) -> StoreResult<Option<Note>> {
        let sql = format!(
            "UPDATE notes SET \
                subject = $3, title = $4, content = $5, tags = $6, category = $7, \
                is_favorite = $8, is_public = COALESCE($9, is_public), updated_at = now() \
             WHERE owner_id = $1 AND id = $2 RETURNING {NOTE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .bind(note_id)
            .bind(&update.subject)
            .bind(&update.title)
            .bind(&update.content)
            .bind(&update.tags)
            .bind(&update.category)
            .bind(update.is_favorite)
            .bind(update.is_public)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn toggle_favorite(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        let sql = format!(
            "UPDATE notes SET is_favorite = NOT is_favorite, updated_at = now() \
             WHERE owner_id = $1 AND id = $2 RETURNING {NOTE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn toggle_public(&self, owner_id: i64, note_id: i64) -> StoreResult<Option<Note>> {
        let sql = format!(
            "UPDATE notes SET is_public = NOT is_public, updated_at = now() \
             WHERE owner_id = $1 AND id = $2 RETURNING {NOTE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_scoped(&self, owner_id: i64, note_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notes WHERE owner_id = $1 AND id = $2")
            .bind(owner_id)
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner_id: i64, page: PageRequest) -> StoreResult<Page<Note>> {
        self.fetch_page("owner_id = $1", vec![Bind::I64(owner_id)], page)
            .await
    }

    async fn list_by_owner_and_subject(
        &self,
        owner_id: i64,
        subject: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        self.fetch_page(
            "owner_id = $1 AND subject = $2",
            vec![Bind::I64(owner_id), Bind::Text(subject.to_string())],
            page,
        )
        .await
    }

    async fn list_by_owner_and_category(
        &self,
        owner_id: i64,
        category: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        self.fetch_page(
            "owner_id = $1 AND category = $2",
            vec![Bind::I64(owner_id), Bind::Text(category.to_string())],
            page,
        )
        .await
    }

    async fn list_by_owner_and_tag(
        &self,
        owner_id: i64,
        tag: &str,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        self.fetch_page(
            "owner_id = $1 AND $2 = ANY(tags)",
            vec![Bind::I64(owner_id), Bind::Text(tag.to_string())],
            page,
        )
        .await
    }

    async fn list_favorites(&self, owner_id: i64, page: PageRequest) -> StoreResult<Page<Note>> {
        self.fetch_page(
            "owner_id = $1 AND is_favorite",
            vec![Bind::I64(owner_id)],
            page,
        )
        .await
    }

    async fn search(
        &self,
        owner_id: i64,
        search: NoteSearch,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        let where_clause = "owner_id = $1 \
             AND ($2::text IS NULL OR title ILIKE '%' || $2 || '%' \
                                   OR content ILIKE '%' || $2 || '%') \
             AND ($3::text IS NULL OR subject = $3) \
             AND ($4::text IS NULL OR category = $4) \
             AND ($5::boolean IS NULL OR is_favorite = $5)";
        self.fetch_page(
            where_clause,
            vec![
                Bind::I64(owner_id),
                Bind::OptText(search.keyword),
                Bind::OptText(search.subject),
                Bind::OptText(search.category),
                Bind::OptBool(search.is_favorite),
            ],
            page,
        )
        .await
    }

    async fn tags_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>> {
        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT unnest(tags) AS tag FROM notes WHERE owner_id = $1 ORDER BY tag",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    async fn subjects_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>> {
        let subjects: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT subject FROM notes WHERE owner_id = $1 ORDER BY subject",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subjects)
    }

    async fn categories_for_owner(&self, owner_id: i64) -> StoreResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM notes \
             WHERE owner_id = $1 AND category IS NOT NULL ORDER BY category",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn count_by_owner(&self, owner_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_favorites_by_owner(&self, owner_id: i64) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notes WHERE owner_id = $1 AND is_favorite")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn recent_updated(&self, owner_id: i64, limit: i64) -> StoreResult<Vec<Note>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = $1 \
             ORDER BY updated_at DESC LIMIT $2"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn recent_created(&self, owner_id: i64, limit: i64) -> StoreResult<Vec<Note>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE owner_id = $1 \
             ORDER BY created_at DESC LIMIT $2"
        );
        Ok(sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_public(&self, page: PageRequest) -> StoreResult<Page<Note>> {
        self.fetch_page("is_public", vec![], page).await
    }

    async fn list_public_by_owner(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> StoreResult<Page<Note>> {
        self.fetch_page(
            "owner_id = $1 AND is_public",
            vec![Bind::I64(owner_id)],
            page,
        )
        .await
    }
}
