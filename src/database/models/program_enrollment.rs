use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle states for a registrar-sourced program enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramEnrollmentStatus {
    Enrolled,
    Pending,
    Suspended,
    Withdrawn,
}

impl ProgramEnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramEnrollmentStatus::Enrolled => "enrolled",
            ProgramEnrollmentStatus::Pending => "pending",
            ProgramEnrollmentStatus::Suspended => "suspended",
            ProgramEnrollmentStatus::Withdrawn => "withdrawn",
        }
    }
}

impl FromStr for ProgramEnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enrolled" => Ok(ProgramEnrollmentStatus::Enrolled),
            "pending" => Ok(ProgramEnrollmentStatus::Pending),
            "suspended" => Ok(ProgramEnrollmentStatus::Suspended),
            "withdrawn" => Ok(ProgramEnrollmentStatus::Withdrawn),
            other => Err(format!("unknown enrollment status: {}", other)),
        }
    }
}

/// States permitted while the enrollee has no platform account yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitingEnrollmentStatus {
    Enrolled,
    Pending,
}

impl WaitingEnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WaitingEnrollmentStatus::Enrolled => "enrolled",
            WaitingEnrollmentStatus::Pending => "pending",
        }
    }
}

impl FromStr for WaitingEnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enrolled" => Ok(WaitingEnrollmentStatus::Enrolled),
            "pending" => Ok(WaitingEnrollmentStatus::Pending),
            other => Err(format!("unknown waiting enrollment status: {}", other)),
        }
    }
}

/// Program enrollment synced from the registrar service for a known user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramEnrollment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub external_user_key: Option<String>,
    pub program_uuid: Uuid,
    pub curriculum_uuid: Uuid,
    pub status: ProgramEnrollmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Program enrollment held by email until the enrollee registers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingProgramEnrollment {
    pub id: Uuid,
    pub email: String,
    pub external_user_key: Option<String>,
    pub program_uuid: Uuid,
    pub curriculum_uuid: Uuid,
    pub status: WaitingEnrollmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ProgramEnrollmentStatus::Enrolled,
            ProgramEnrollmentStatus::Pending,
            ProgramEnrollmentStatus::Suspended,
            ProgramEnrollmentStatus::Withdrawn,
        ] {
            assert_eq!(status.as_str().parse::<ProgramEnrollmentStatus>().unwrap(), status);
        }
        assert!("graduated".parse::<ProgramEnrollmentStatus>().is_err());
    }

    #[test]
    fn waiting_vocabulary_is_narrower() {
        assert!("pending".parse::<WaitingEnrollmentStatus>().is_ok());
        assert!("suspended".parse::<WaitingEnrollmentStatus>().is_err());
        assert!("withdrawn".parse::<WaitingEnrollmentStatus>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&ProgramEnrollmentStatus::Withdrawn).unwrap();
        assert_eq!(json, "\"withdrawn\"");
    }
}
