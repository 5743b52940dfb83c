use crate::error::ApiError;
use crate::middleware::auth::AuthUser;

/// Operations a caller can request against a course's mode collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Create,
    Retrieve,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::List => "list",
            Action::Create => "create",
            Action::Retrieve => "retrieve",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Staff-only access policy for course modes.
///
/// Evaluated before any repository access so a denied caller never learns
/// whether the requested resource exists. There is no per-course role
/// distinction: enrolled students are denied like everyone else.
pub fn authorize(principal: &AuthUser, action: Action) -> Result<(), ApiError> {
    if principal.staff {
        return Ok(());
    }

    tracing::warn!(
        "denied course mode {} for non-staff user '{}'",
        action.as_str(),
        principal.username
    );
    Err(ApiError::forbidden(
        "You do not have permission to perform this action",
    ))
}
