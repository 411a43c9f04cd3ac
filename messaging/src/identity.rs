//! Fail-closed boundary for the authenticated user.
//!
//! Every operation in this module requires an authenticated identity; there
//! is no anonymous/guest path. Session state arrives as `Option<&str>` from
//! the outer application and is validated exactly once, here.

use careline_core::{MessagingError, Result};

/// A validated authenticated user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: String,
}

impl Identity {
    /// Validates session state. `None` or an empty id fails with
    /// [`MessagingError::AuthenticationRequired`].
    pub fn from_session(user_id: Option<&str>) -> Result<Self> {
        match user_id {
            Some(id) if !id.is_empty() => Ok(Self {
                user_id: id.to_string(),
            }),
            _ => Err(MessagingError::AuthenticationRequired),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_accepts_user() {
        let identity = Identity::from_session(Some("u1")).expect("Should be authenticated");
        assert_eq!(identity.user_id(), "u1");
    }

    #[test]
    fn test_from_session_fails_closed() {
        assert!(matches!(
            Identity::from_session(None),
            Err(MessagingError::AuthenticationRequired)
        ));
        assert!(matches!(
            Identity::from_session(Some("")),
            Err(MessagingError::AuthenticationRequired)
        ));
    }
}
