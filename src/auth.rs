//! Who is behind a session.
//!
//! There is no credential check: logging in records a user name, and optionally the
//! restaurant the user works for, in the session.

use crate::errors::Result;
use crate::session::{slots, Session};

pub fn is_authenticated(session: &Session) -> bool {
    matches!(session.get::<String>(slots::USERNAME), Ok(Some(name)) if !name.is_empty())
}

/// Name of the logged in user, empty if nobody is
pub fn user_name(session: &Session) -> Result<String> {
    Ok(session.get::<String>(slots::USERNAME)?.unwrap_or_default())
}

/// Restaurant whose orders the user handles, None for customers
pub fn restaurant_link(session: &Session) -> Result<Option<String>> {
    Ok(session
        .get::<String>(slots::RESTAURANT)?
        .filter(|link| !link.is_empty()))
}

/// Attach a user, and optionally a restaurant, to the session
pub fn login(session: &mut Session, user_name: &str, rest_link: Option<&str>) -> Result<()> {
    session.set(slots::USERNAME, &user_name)?;
    match rest_link {
        Some(rest_link) => session.set(slots::RESTAURANT, &rest_link)?,
        None => {
            session.values.remove(slots::RESTAURANT);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login() {
        let mut session = Session::new();
        assert!(!is_authenticated(&session));
        assert_eq!(user_name(&session).unwrap(), "");
        assert_eq!(restaurant_link(&session).unwrap(), None);

        login(&mut session, "alice", None).unwrap();
        assert!(is_authenticated(&session));
        assert_eq!(user_name(&session).unwrap(), "alice");
        assert_eq!(restaurant_link(&session).unwrap(), None);

        login(&mut session, "chef", Some("burger-joint")).unwrap();
        assert_eq!(user_name(&session).unwrap(), "chef");
        assert_eq!(
            restaurant_link(&session).unwrap(),
            Some("burger-joint".to_string())
        );

        login(&mut session, "alice", None).unwrap();
        assert_eq!(restaurant_link(&session).unwrap(), None);
    }

    #[test]
    fn test_wrong_user_name_type() {
        let mut session = Session::new();
        session.set(slots::USERNAME, &42).unwrap();
        assert!(!is_authenticated(&session));
        assert!(user_name(&session).is_err());
    }
}
