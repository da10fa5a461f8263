use async_trait::async_trait;
use chrono::Utc;
use learn_core::model::{CourseId, UserId, UserProgress};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{completed_items_from_json, completed_items_to_json, conn, ser};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        user_id: UserId,
        course_id: CourseId,
    ) -> Result<UserProgress, StorageError> {
        let row = sqlx::query(
            r"
            SELECT completed_items
            FROM user_progress
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(user_id.to_string())
        .bind(course_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Err(StorageError::NotFound);
        };

        let json: String = row.try_get("completed_items").map_err(ser)?;
        Ok(UserProgress {
            user_id,
            course_id,
            completed_items: completed_items_from_json(&json)?,
        })
    }

    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, course_id, completed_items, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, course_id) DO UPDATE SET
                completed_items = excluded.completed_items,
                updated_at = excluded.updated_at
            ",
        )
        .bind(progress.user_id.to_string())
        .bind(progress.course_id.to_string())
        .bind(completed_items_to_json(&progress.completed_items)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }
}
