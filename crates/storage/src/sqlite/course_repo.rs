use async_trait::async_trait;
use chrono::Utc;
use learn_core::model::{
    Course, CourseId, Exercise, Lesson, LessonId, LessonItem, LessonItemId,
};
use sqlx::{QueryBuilder, Row, Sqlite};

use super::SqliteRepository;
use super::mapping::{
    conn, map_course_row, map_exercise_row, map_item_row, map_lesson_row, options_to_json,
};
use crate::repository::{ContentRepository, CourseRepository, StorageError};

#[async_trait]
impl CourseRepository for SqliteRepository {
    async fn first_course(&self) -> Result<Option<Course>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, subtitle
            FROM courses
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_course_row).transpose()
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, title, number
            FROM lessons
            WHERE course_id = ?1
            ORDER BY number ASC
            ",
        )
        .bind(course_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_lesson_row).collect()
    }

    async fn items_for_lessons(
        &self,
        lesson_ids: &[LessonId],
    ) -> Result<Vec<LessonItem>, StorageError> {
        if lesson_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, lesson_id, title, type, content_markdown, order_index \
             FROM lesson_items WHERE lesson_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in lesson_ids {
            ids.push_bind(id.to_string());
        }
        qb.push(") ORDER BY order_index ASC");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;
        rows.iter().map(map_item_row).collect()
    }

    async fn exercises_for_items(
        &self,
        item_ids: &[LessonItemId],
    ) -> Result<Vec<Exercise>, StorageError> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, lesson_item_id, type, question, options, answer, tolerance \
             FROM exercises WHERE lesson_item_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in item_ids {
            ids.push_bind(id.to_string());
        }
        qb.push(")");

        let rows = qb.build().fetch_all(&self.pool).await.map_err(conn)?;
        Ok(rows
            .iter()
            .filter_map(|row| match map_exercise_row(row) {
                Ok(exercise) => Some(exercise),
                Err(error) => {
                    let exercise_id: String = row.try_get("id").unwrap_or_default();
                    tracing::warn!(%exercise_id, %error, "skipping malformed exercise");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl ContentRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO courses (id, title, subtitle, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert so course order is stable
                title = excluded.title,
                subtitle = excluded.subtitle
            ",
        )
        .bind(course.id.to_string())
        .bind(&course.title)
        .bind(&course.subtitle)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lessons (id, course_id, title, number)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                course_id = excluded.course_id,
                title = excluded.title,
                number = excluded.number
            ",
        )
        .bind(lesson.id.to_string())
        .bind(lesson.course_id.to_string())
        .bind(&lesson.title)
        .bind(i64::from(lesson.number))
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn upsert_item(&self, item: &LessonItem) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_items (id, lesson_id, title, type, content_markdown, order_index)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                lesson_id = excluded.lesson_id,
                title = excluded.title,
                type = excluded.type,
                content_markdown = excluded.content_markdown,
                order_index = excluded.order_index
            ",
        )
        .bind(item.id.to_string())
        .bind(item.lesson_id.to_string())
        .bind(&item.title)
        .bind(item.kind.as_str())
        .bind(&item.content_markdown)
        .bind(item.order_index)
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn upsert_exercise(&self, exercise: &Exercise) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO exercises (id, lesson_item_id, type, question, options, answer, tolerance)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                lesson_item_id = excluded.lesson_item_id,
                type = excluded.type,
                question = excluded.question,
                options = excluded.options,
                answer = excluded.answer,
                tolerance = excluded.tolerance
            ",
        )
        .bind(exercise.id().to_string())
        .bind(exercise.lesson_item_id().to_string())
        .bind(exercise.kind().as_str())
        .bind(exercise.question())
        .bind(options_to_json(exercise)?)
        .bind(exercise.answer())
        .bind(exercise.tolerance())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
