use async_trait::async_trait;
use learn_core::model::{Attempt, ExerciseId, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_attempt_row, ser};
use crate::repository::{AttemptRepository, StorageError};

#[async_trait]
impl AttemptRepository for SqliteRepository {
    async fn insert_attempt(&self, attempt: &Attempt) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&attempt.submitted_answer).map_err(ser)?;

        sqlx::query(
            r"
                INSERT INTO attempts (user_id, exercise_id, submitted_answer, is_correct, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(attempt.user_id.to_string())
        .bind(attempt.exercise_id.to_string())
        .bind(payload)
        .bind(i64::from(attempt.is_correct))
        .bind(attempt.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn attempts_for_exercise(
        &self,
        user_id: UserId,
        exercise_id: ExerciseId,
    ) -> Result<Vec<Attempt>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT user_id, exercise_id, submitted_answer, is_correct, created_at
                FROM attempts
                WHERE user_id = ?1 AND exercise_id = ?2
                ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id.to_string())
        .bind(exercise_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
