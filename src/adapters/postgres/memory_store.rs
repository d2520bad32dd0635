//! PostgreSQL implementation of the storage gateway.
//!
//! Every method is a single round trip except `erase_user`, which runs one
//! best-effort transaction across all memory tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::foundation::{EntryId, SessionId, Timestamp, UserId};
use crate::domain::memory::{
    BreakthroughMoment, ContextEntry, ConversationEntry, ProfilePatch, SessionTheme,
    StageProgression, UserProfile,
};
use crate::ports::{HistoryQuery, MemoryStore, StoreError};

/// PostgreSQL storage gateway.
#[derive(Clone)]
pub struct PostgresMemoryStore {
    pool: PgPool,
}

impl PostgresMemoryStore {
    /// Creates a new gateway over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(context: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::Database(format!("{context}: {e}"))
}

fn entry_id(row: &PgRow) -> Result<EntryId, StoreError> {
    let id: Uuid = row
        .try_get("id")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    Ok(EntryId::from_uuid(id))
}

fn user_id(row: &PgRow) -> Result<UserId, StoreError> {
    let raw: String = row
        .try_get("user_id")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    UserId::new(raw).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn session_id(row: &PgRow) -> Result<Option<SessionId>, StoreError> {
    let raw: Option<String> = row
        .try_get("session_id")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    raw.map(SessionId::new)
        .transpose()
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

fn created_at(row: &PgRow) -> Result<Timestamp, StoreError> {
    let dt: DateTime<Utc> = row
        .try_get("created_at")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    Ok(Timestamp::from_datetime(dt))
}

fn conversation_from_row(row: &PgRow) -> Result<ConversationEntry, StoreError> {
    let role: String = row
        .try_get("role")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    Ok(ConversationEntry {
        id: entry_id(row)?,
        user_id: user_id(row)?,
        role: role
            .parse()
            .map_err(|e: crate::domain::foundation::ValidationError| {
                StoreError::Serialization(e.to_string())
            })?,
        content: row
            .try_get("content")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        stage: row
            .try_get("stage")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        created_at: created_at(row)?,
    })
}

fn profile_from_row(row: &PgRow) -> Result<UserProfile, StoreError> {
    let registered: DateTime<Utc> = row
        .try_get("registered_at")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    let updated: DateTime<Utc> = row
        .try_get("updated_at")
        .map_err(|e| StoreError::Database(e.to_string()))?;
    Ok(UserProfile {
        user_id: user_id(row)?,
        display_name: row
            .try_get("display_name")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        current_stage: row
            .try_get("current_stage")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        registered_at: Timestamp::from_datetime(registered),
        session_count: row
            .try_get("session_count")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        recurring_themes: row
            .try_get("recurring_themes")
            .map_err(|e| StoreError::Database(e.to_string()))?,
        updated_at: Timestamp::from_datetime(updated),
    })
}

#[async_trait]
impl MemoryStore for PostgresMemoryStore {
    async fn store_conversation_entry(
        &self,
        entry: ConversationEntry,
    ) -> Result<ConversationEntry, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversation_entries (id, user_id, role, content, stage, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.user_id.as_str())
        .bind(entry.role.as_str())
        .bind(&entry.content)
        .bind(&entry.stage)
        .bind(entry.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("insert conversation entry"))?;
        Ok(entry)
    }

    async fn conversation_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<ConversationEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, role, content, stage, created_at
            FROM conversation_entries
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("fetch conversation history"))?;

        rows.iter().map(conversation_from_row).collect()
    }

    async fn upsert_profile(
        &self,
        user_id: &UserId,
        patch: ProfilePatch,
    ) -> Result<UserProfile, StoreError> {
        // Merge semantics: NULL patch fields keep the stored value.
        let row = sqlx::query(
            r#"
            INSERT INTO profiles
                (user_id, display_name, current_stage, registered_at,
                 session_count, recurring_themes, updated_at)
            VALUES ($1, $2, $3, NOW(), COALESCE($4, 0), COALESCE($5, '{}'::TEXT[]), NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                display_name     = COALESCE(EXCLUDED.display_name, profiles.display_name),
                current_stage    = COALESCE(EXCLUDED.current_stage, profiles.current_stage),
                session_count    = COALESCE($4, profiles.session_count),
                recurring_themes = COALESCE($5, profiles.recurring_themes),
                updated_at       = NOW()
            RETURNING user_id, display_name, current_stage, registered_at,
                      session_count, recurring_themes, updated_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(&patch.display_name)
        .bind(&patch.current_stage)
        .bind(patch.session_count)
        .bind(&patch.recurring_themes)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("upsert profile"))?;

        profile_from_row(&row)
    }

    async fn fetch_profile(&self, user_id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT user_id, display_name, current_stage, registered_at,
                   session_count, recurring_themes, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("fetch profile"))?;

        row.as_ref().map(profile_from_row).transpose()
    }

    async fn record_stage(
        &self,
        progression: StageProgression,
    ) -> Result<StageProgression, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO stage_progressions (id, user_id, session_id, stage, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(progression.id.as_uuid())
        .bind(progression.user_id.as_str())
        .bind(progression.session_id.as_ref().map(|s| s.as_str()))
        .bind(&progression.stage)
        .bind(progression.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("insert stage progression"))?;
        Ok(progression)
    }

    async fn stage_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<StageProgression>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, session_id, stage, created_at
            FROM stage_progressions
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR session_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(query.session_id.as_ref().map(|s| s.as_str()))
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("fetch stage history"))?;

        rows.iter()
            .map(|row| {
                Ok(StageProgression {
                    id: entry_id(row)?,
                    user_id: self::user_id(row)?,
                    session_id: session_id(row)?,
                    stage: row
                        .try_get("stage")
                        .map_err(|e| StoreError::Database(e.to_string()))?,
                    created_at: created_at(row)?,
                })
            })
            .collect()
    }

    async fn store_context(&self, entry: ContextEntry) -> Result<ContextEntry, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO context_entries (id, user_id, session_id, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.user_id.as_str())
        .bind(entry.session_id.as_ref().map(|s| s.as_str()))
        .bind(&entry.payload)
        .bind(entry.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("insert context entry"))?;
        Ok(entry)
    }

    async fn context_history(
        &self,
        user_id: &UserId,
        query: &HistoryQuery,
    ) -> Result<Vec<ContextEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, session_id, payload, created_at
            FROM context_entries
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR session_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id.as_str())
        .bind(query.session_id.as_ref().map(|s| s.as_str()))
        .bind(query.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("fetch context history"))?;

        rows.iter()
            .map(|row| {
                Ok(ContextEntry {
                    id: entry_id(row)?,
                    user_id: self::user_id(row)?,
                    session_id: session_id(row)?,
                    payload: row
                        .try_get("payload")
                        .map_err(|e| StoreError::Database(e.to_string()))?,
                    created_at: created_at(row)?,
                })
            })
            .collect()
    }

    async fn record_breakthrough(
        &self,
        moment: BreakthroughMoment,
    ) -> Result<BreakthroughMoment, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO breakthrough_moments (id, user_id, session_id, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(moment.id.as_uuid())
        .bind(moment.user_id.as_str())
        .bind(moment.session_id.as_str())
        .bind(&moment.description)
        .bind(moment.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("insert breakthrough"))?;
        Ok(moment)
    }

    async fn breakthroughs_for_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<BreakthroughMoment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, session_id, description, created_at
            FROM breakthrough_moments
            WHERE session_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(session_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("fetch breakthroughs"))?;

        rows.iter()
            .map(|row| {
                let sid = self::session_id(row)?.ok_or_else(|| {
                    StoreError::Serialization("breakthrough row missing session_id".into())
                })?;
                Ok(BreakthroughMoment {
                    id: entry_id(row)?,
                    user_id: user_id(row)?,
                    session_id: sid,
                    description: row
                        .try_get("description")
                        .map_err(|e| StoreError::Database(e.to_string()))?,
                    created_at: created_at(row)?,
                })
            })
            .collect()
    }

    async fn record_theme(&self, theme: SessionTheme) -> Result<SessionTheme, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO session_themes (id, user_id, session_id, theme, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(theme.id.as_uuid())
        .bind(theme.user_id.as_str())
        .bind(theme.session_id.as_str())
        .bind(&theme.theme)
        .bind(theme.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_err("insert theme"))?;
        Ok(theme)
    }

    async fn themes_for_session(
        &self,
        session_id: &SessionId,
        limit: usize,
    ) -> Result<Vec<SessionTheme>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, session_id, theme, created_at
            FROM session_themes
            WHERE session_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(session_id.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("fetch themes"))?;

        rows.iter()
            .map(|row| {
                let sid = self::session_id(row)?.ok_or_else(|| {
                    StoreError::Serialization("theme row missing session_id".into())
                })?;
                Ok(SessionTheme {
                    id: entry_id(row)?,
                    user_id: user_id(row)?,
                    session_id: sid,
                    theme: row
                        .try_get("theme")
                        .map_err(|e| StoreError::Database(e.to_string()))?,
                    created_at: created_at(row)?,
                })
            })
            .collect()
    }

    async fn erase_user(&self, user_id: &UserId) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("begin erase transaction"))?;

        for table in [
            "profiles",
            "conversation_entries",
            "stage_progressions",
            "context_entries",
            "breakthrough_moments",
            "session_themes",
        ] {
            sqlx::query(&format!("DELETE FROM {table} WHERE user_id = $1"))
                .bind(user_id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err("erase user data"))?;
        }

        tx.commit().await.map_err(db_err("commit erase"))?;
        Ok(())
    }
}
