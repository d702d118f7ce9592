//! Capacity-aware seat allocation on classes.
//!
//! A seat is one unit of a class's `enrolled` counter. [`Seats::allocate`] picks the least-filled
//! class of a grade that still has room and increments its counter in a single statement, so two
//! concurrent allocations can never push a class past its capacity. [`Seats::release`] is the
//! inverse and never takes the counter below zero.
//!
//! Allocation and the student insert that follows are not one transaction. A caller whose insert
//! fails must [`release`](Seats::release) the seat it was given.

use crate::db::{errors::Result, models::classes::ClassDBResponse};
use crate::types::{ClassId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::{debug, instrument};

pub struct Seats<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Seats<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Reserve a seat in a class of `grade`.
    ///
    /// Classes with the fewest enrolled students are preferred, oldest first among equals.
    /// Returns the class after the increment, or `None` if every class of the grade is full (or
    /// there is none).
    #[instrument(skip(self), err)]
    pub async fn allocate(&mut self, grade: &str) -> Result<Option<ClassDBResponse>> {
        let class = sqlx::query_as::<_, ClassDBResponse>(
            r#"
            UPDATE classes
            SET enrolled = enrolled + 1, updated_at = NOW()
            WHERE id = (
                SELECT id FROM classes
                WHERE grade = $1 AND enrolled < capacity
                ORDER BY enrolled ASC, created_at ASC
                LIMIT 1
                FOR UPDATE
            )
            AND enrolled < capacity
            RETURNING *
            "#,
        )
        .bind(grade)
        .fetch_optional(&mut *self.db)
        .await?;

        match &class {
            Some(class) => debug!(class_id = %abbrev_uuid(&class.id), enrolled = class.enrolled, "Seat allocated"),
            None => debug!("No free seat"),
        }

        Ok(class)
    }

    /// Give back one seat. Returns whether a seat was actually released.
    #[instrument(skip(self), fields(class_id = %abbrev_uuid(&class_id)), err)]
    pub async fn release(&mut self, class_id: ClassId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE classes
            SET enrolled = enrolled - 1, updated_at = NOW()
            WHERE id = $1 AND enrolled > 0
            "#,
        )
        .bind(class_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
