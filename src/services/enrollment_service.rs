use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::database::manager::{DatabaseManager, DatabaseError};
use crate::database::models::{
    ProgramEnrollment, ProgramEnrollmentStatus, WaitingEnrollmentStatus, WaitingProgramEnrollment,
};

#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Database manager error: {0}")]
    DatabaseManager(#[from] DatabaseError),
    #[error("User {user_id} is already enrolled in program {program_uuid}")]
    AlreadyEnrolled { program_uuid: Uuid, user_id: Uuid },
    #[error("Enrollment not found: {0}")]
    NotFound(Uuid),
    #[error("Invalid status value in storage: {0}")]
    InvalidStatus(String),
}

/// Storage operations for registrar program enrollments.
///
/// Deliberately free of enrollment business rules: callers decide when a
/// status transition is legitimate, this service only persists it.
pub struct ProgramEnrollmentService {
    pool: PgPool,
}

impl ProgramEnrollmentService {
    pub async fn new() -> Result<Self, EnrollmentError> {
        let pool = DatabaseManager::main_pool().await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an enrollment for a registered user
    pub async fn enroll(
        &self,
        user_id: Uuid,
        program_uuid: Uuid,
        curriculum_uuid: Uuid,
        external_user_key: Option<&str>,
        status: ProgramEnrollmentStatus,
    ) -> Result<ProgramEnrollment, EnrollmentError> {
        if self.find(program_uuid, user_id).await?.is_some() {
            return Err(EnrollmentError::AlreadyEnrolled {
                program_uuid,
                user_id,
            });
        }

        let enrollment = ProgramEnrollment {
            id: Uuid::new_v4(),
            user_id,
            external_user_key: external_user_key.map(str::to_string),
            program_uuid,
            curriculum_uuid,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO program_enrollments
                (id, user_id, external_user_key, program_uuid, curriculum_uuid,
                 status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(enrollment.id)
        .bind(enrollment.user_id)
        .bind(&enrollment.external_user_key)
        .bind(enrollment.program_uuid)
        .bind(enrollment.curriculum_uuid)
        .bind(enrollment.status.as_str())
        .bind(enrollment.created_at)
        .bind(enrollment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// Record an enrollment for an email address with no platform account yet
    pub async fn enroll_waiting(
        &self,
        email: &str,
        program_uuid: Uuid,
        curriculum_uuid: Uuid,
        external_user_key: Option<&str>,
        status: WaitingEnrollmentStatus,
    ) -> Result<WaitingProgramEnrollment, EnrollmentError> {
        let enrollment = WaitingProgramEnrollment {
            id: Uuid::new_v4(),
            email: email.to_string(),
            external_user_key: external_user_key.map(str::to_string),
            program_uuid,
            curriculum_uuid,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO waiting_program_enrollments
                (id, email, external_user_key, program_uuid, curriculum_uuid,
                 status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(enrollment.id)
        .bind(&enrollment.email)
        .bind(&enrollment.external_user_key)
        .bind(enrollment.program_uuid)
        .bind(enrollment.curriculum_uuid)
        .bind(enrollment.status.as_str())
        .bind(enrollment.created_at)
        .bind(enrollment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(enrollment)
    }

    /// Enrollment for a (program, user) pair, if one exists
    pub async fn find(
        &self,
        program_uuid: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProgramEnrollment>, EnrollmentError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, external_user_key, program_uuid, curriculum_uuid,
                   status, created_at, updated_at
            FROM program_enrollments
            WHERE program_uuid = $1 AND user_id = $2
            "#,
        )
        .bind(program_uuid)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_enrollment).transpose()
    }

    /// All enrollments for a program
    pub async fn for_program(
        &self,
        program_uuid: Uuid,
    ) -> Result<Vec<ProgramEnrollment>, EnrollmentError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, external_user_key, program_uuid, curriculum_uuid,
                   status, created_at, updated_at
            FROM program_enrollments
            WHERE program_uuid = $1
            ORDER BY created_at
            "#,
        )
        .bind(program_uuid)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_enrollment).collect()
    }

    /// Persist a status change decided by the caller
    pub async fn update_status(
        &self,
        id: Uuid,
        status: ProgramEnrollmentStatus,
    ) -> Result<(), EnrollmentError> {
        let result = sqlx::query(
            "UPDATE program_enrollments SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(EnrollmentError::NotFound(id));
        }
        Ok(())
    }

    /// Drop waiting records for an email within a program, returning how many
    /// were removed
    pub async fn remove_waiting(
        &self,
        email: &str,
        program_uuid: Uuid,
    ) -> Result<u64, EnrollmentError> {
        let result = sqlx::query(
            "DELETE FROM waiting_program_enrollments WHERE email = $1 AND program_uuid = $2",
        )
        .bind(email)
        .bind(program_uuid)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn row_to_enrollment(row: PgRow) -> Result<ProgramEnrollment, EnrollmentError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<ProgramEnrollmentStatus>()
        .map_err(EnrollmentError::InvalidStatus)?;

    Ok(ProgramEnrollment {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        external_user_key: row.try_get("external_user_key")?,
        program_uuid: row.try_get("program_uuid")?,
        curriculum_uuid: row.try_get("curriculum_uuid")?,
        status,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
