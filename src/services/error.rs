use thiserror::Error;

/// Failures a caller is expected to show to the user. Anything else
/// surfacing from a service is an internal error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("you do not have permission to modify this post")]
    Forbidden,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("this account has been deactivated")]
    AccountInactive,
    #[error("slug '{0}' is already taken")]
    SlugConflict(String),
    #[error("{0}")]
    Conflict(String),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_joins_messages() {
        let err = ServiceError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "a; b");
        assert_eq!(err.messages(), vec!["a", "b"]);
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = ServiceError::Forbidden.into();
        assert!(matches!(
            err.downcast_ref::<ServiceError>(),
            Some(ServiceError::Forbidden)
        ));
    }
}
