//! `ProfileStore` over the hosted Postgres database.
//!
//! Tables: user_profiles, skills, documents, conversations,
//! conversation_participants, messages. Row-level ownership is enforced by
//! filtering every mutation on `user_id`.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::dialogue::intake::SearchCriteria;
use crate::errors::AppError;
use crate::models::conversation::{Conversation, ConversationRow, ConversationStatus, MessageRow};
use crate::models::profile::{
    DocumentRow, DocumentVisibility, ProfileRecord, ProfileRow, ProfileUpdate, Skill, SkillRow,
};
use crate::services::{NewDocument, ProfileStore};

const MAX_SEARCH_RESULTS: i64 = 50;

#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    /// Opens a connection pool against the profile database.
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("Connecting to PostgreSQL...");

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    async fn skills_for(&self, user_id: Uuid) -> Result<Vec<SkillRow>, AppError> {
        Ok(sqlx::query_as::<_, SkillRow>(
            "SELECT name, level FROM skills WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn documents_for(
        &self,
        user_id: Uuid,
        visibilities: &[&str],
    ) -> Result<Vec<DocumentRow>, AppError> {
        let visibilities: Vec<String> = visibilities.iter().map(|v| v.to_string()).collect();
        Ok(sqlx::query_as::<_, DocumentRow>(
            r#"
            SELECT id, user_id, file_path, name, size, type, visibility, created_at
            FROM documents
            WHERE user_id = $1 AND visibility = ANY($2)
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .bind(&visibilities)
        .fetch_all(&self.pool)
        .await?)
    }
}

const ALL_VISIBILITIES: &[&str] = &["public", "gated", "private"];
const COUNTERPART_VISIBILITIES: &[&str] = &["public", "gated"];

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load_profile(&self, user_id: Uuid) -> Result<ProfileRecord, AppError> {
        let profile = sqlx::query_as::<_, ProfileRow>("SELECT * FROM user_profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {user_id} not found")))?;

        Ok(ProfileRecord {
            skills: self.skills_for(user_id).await?,
            documents: self.documents_for(user_id, ALL_VISIBILITIES).await?,
            profile,
        })
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE user_profiles SET
                name = COALESCE($2, name),
                title = COALESCE($3, title),
                profile_photo_url = COALESCE($4, profile_photo_url),
                roles = COALESCE($5, roles),
                shift = COALESCE($6, shift),
                location = COALESCE($7, location),
                pay_expectations = COALESCE($8, pay_expectations),
                contact_methods = COALESCE($9, contact_methods),
                time_zone = COALESCE($10, time_zone),
                working_hours = COALESCE($11, working_hours),
                call_available_hours = COALESCE($12, call_available_hours),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(&update.name)
        .bind(&update.title)
        .bind(&update.profile_photo_url)
        .bind(&update.roles)
        .bind(&update.shift)
        .bind(&update.location)
        .bind(&update.pay_expectations)
        .bind(&update.contact_methods)
        .bind(&update.time_zone)
        .bind(&update.working_hours)
        .bind(&update.call_available_hours)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Profile {user_id} not found")));
        }
        Ok(())
    }

    async fn replace_skills(&self, user_id: Uuid, skills: &[Skill]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM skills WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for skill in skills {
            sqlx::query("INSERT INTO skills (user_id, name, level) VALUES ($1, $2, $3)")
                .bind(user_id)
                .bind(&skill.name)
                .bind(skill.level as i16)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Replaced {} skills for user {user_id}", skills.len());
        Ok(())
    }

    async fn insert_document(&self, document: &NewDocument) -> Result<DocumentRow, AppError> {
        Ok(sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (user_id, file_path, name, size, type, visibility)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, file_path, name, size, type, visibility, created_at
            "#,
        )
        .bind(document.user_id)
        .bind(&document.file_path)
        .bind(&document.name)
        .bind(document.size)
        .bind(&document.file_type)
        .bind(document.visibility.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_document(&self, user_id: Uuid, document_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM documents WHERE id = $1 AND user_id = $2")
            .bind(document_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_document_visibility(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        visibility: DocumentVisibility,
    ) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE documents SET visibility = $1 WHERE id = $2 AND user_id = $3")
                .bind(visibility.as_str())
                .bind(document_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Document {document_id} not found")));
        }
        Ok(())
    }

    async fn search_candidates(
        &self,
        criteria: &SearchCriteria,
    ) -> Result<Vec<ProfileRecord>, AppError> {
        let skills: Vec<String> = criteria.skills.iter().map(|s| s.to_lowercase()).collect();
        let profiles = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT p.*
            FROM user_profiles p
            WHERE lower(p.user_type) = 'candidate'
              AND (
                    $3 ILIKE 'remote'
                 OR p.location ILIKE '%' || $3 || '%'
              )
              AND (
                    EXISTS (
                        SELECT 1 FROM skills s
                        WHERE s.user_id = p.id AND lower(s.name) = ANY($2)
                    )
                 OR p.title ILIKE '%' || $1 || '%'
                 OR EXISTS (
                        SELECT 1 FROM unnest(p.roles) AS r(role)
                        WHERE r.role ILIKE '%' || $1 || '%'
                    )
              )
            ORDER BY p.updated_at DESC NULLS LAST
            LIMIT $4
            "#,
        )
        .bind(&criteria.title)
        .bind(&skills)
        .bind(&criteria.location)
        .bind(MAX_SEARCH_RESULTS)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(profiles.len());
        for profile in profiles {
            records.push(ProfileRecord {
                skills: self.skills_for(profile.id).await?,
                documents: self
                    .documents_for(profile.id, COUNTERPART_VISIBILITIES)
                    .await?,
                profile,
            });
        }

        info!(
            "Candidate search for '{}' in '{}' matched {} profiles",
            criteria.title,
            criteria.location,
            records.len()
        );
        Ok(records)
    }

    async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, AppError> {
        let rows = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT c.id, c.status, c.created_at,
                   o.id AS other_id, o.name AS other_name, o.profile_photo_url AS other_photo_url
            FROM conversations c
            JOIN conversation_participants me
              ON me.conversation_id = c.id AND me.user_id = $1
            JOIN conversation_participants them
              ON them.conversation_id = c.id AND them.user_id <> $1
            JOIN user_profiles o ON o.id = them.user_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let messages = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, conversation_id, sender_id, text, created_at
            FROM messages
            WHERE conversation_id = ANY($1)
            ORDER BY created_at ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_conversation: HashMap<Uuid, Vec<MessageRow>> = HashMap::new();
        for message in messages {
            by_conversation
                .entry(message.conversation_id)
                .or_default()
                .push(message);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let thread = by_conversation.remove(&row.id).unwrap_or_default();
                Conversation::from_rows(row, &thread, user_id)
            })
            .collect())
    }

    async fn create_connection_request(
        &self,
        recruiter_id: Uuid,
        candidate_id: Uuid,
        text: &str,
    ) -> Result<Uuid, AppError> {
        let mut tx = self.pool.begin().await?;

        let conversation_id: Uuid =
            sqlx::query_scalar("INSERT INTO conversations (status) VALUES ($1) RETURNING id")
                .bind(ConversationStatus::Pending.as_str())
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query(
            "INSERT INTO conversation_participants (conversation_id, user_id) VALUES ($1, $2), ($1, $3)",
        )
        .bind(conversation_id)
        .bind(recruiter_id)
        .bind(candidate_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO messages (conversation_id, sender_id, text) VALUES ($1, $2, $3)")
            .bind(conversation_id)
            .bind(recruiter_id)
            .bind(text)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Recruiter {recruiter_id} requested connection {conversation_id} with {candidate_id}");
        Ok(conversation_id)
    }

    async fn set_conversation_status(
        &self,
        conversation_id: Uuid,
        status: ConversationStatus,
    ) -> Result<(), AppError> {
        // Guarded on 'pending' so a status can never revert.
        let result = sqlx::query(
            "UPDATE conversations SET status = $1 WHERE id = $2 AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Conversation {conversation_id} is no longer pending"
            )));
        }
        Ok(())
    }

    async fn insert_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: &str,
    ) -> Result<MessageRow, AppError> {
        Ok(sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, text)
            VALUES ($1, $2, $3)
            RETURNING id, conversation_id, sender_id, text, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?)
    }
}
