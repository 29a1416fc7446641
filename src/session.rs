use std::collections::HashMap;

use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};

use crate::basket::Basket;
use crate::errors::{Error, Result};
use crate::http::Request;

pub mod sqlite;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

/// Names of the values kept in a session
pub mod slots {
    /// The basket being filled, absent until the first item is added
    pub const BASKET: &str = "basket";
    /// Name of the logged in user
    pub const USERNAME: &str = "username";
    /// Restaurant the logged in user works for, if any
    pub const RESTAURANT: &str = "restaurant";
}

/// State attached to a client across requests
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    /// Random identifier, sent back to the client in a cookie
    pub id: String,
    /// Opaque JSON values indexed by slot name
    pub values: HashMap<String, serde_json::Value>,
}

impl Session {
    /// Start a new session with a fresh random id
    pub fn new() -> Session {
        Session {
            id: format!("{:032x}", rand::thread_rng().gen::<u128>()),
            values: HashMap::new(),
        }
    }

    /// Read a slot as a `T`
    ///
    /// Returns None if the slot is empty, SessionTypeMismatch if it holds something else.
    pub fn get<T: DeserializeOwned>(&self, slot: &'static str) -> Result<Option<T>> {
        match self.values.get(slot) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|_| Error::SessionTypeMismatch(slot).into()),
        }
    }

    /// Overwrite a slot
    pub fn set<T: Serialize>(&mut self, slot: &str, value: &T) -> Result<()> {
        self.values
            .insert(slot.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn basket(&self) -> Result<Option<Basket>> {
        self.get(slots::BASKET)
    }

    pub fn set_basket(&mut self, basket: &Basket) -> Result<()> {
        self.set(slots::BASKET, basket)
    }

    /// Value of the Set-Cookie header binding the client to this session
    pub fn cookie(&self) -> String {
        format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, self.id)
    }
}

/// Trait hiding where the sessions are kept
pub trait SessionStore: Send + Sync {
    /// Find a session by id, None if it doesn't exist (or expired)
    fn load(&self, id: &str) -> Result<Option<Session>>;

    /// Insert or replace a session
    fn save(&self, session: &Session) -> Result<()>;
}

/// Retrieve the session of the client that sent `request`, or start a new one
pub fn from_request(store: &dyn SessionStore, request: &Request) -> Result<Session> {
    let existing = match request.cookie(SESSION_COOKIE) {
        Some(id) => store
            .load(&id)
            .map_err(|err| Error::SessionUnavailable(err.to_string()))?,
        None => None,
    };
    Ok(existing.unwrap_or_else(Session::new))
}

/// Persist a session, reporting any failure as SessionUnavailable
pub fn save(store: &dyn SessionStore, session: &Session) -> Result<()> {
    store
        .save(session)
        .map_err(|err| Error::SessionUnavailable(err.to_string()).into())
}

/// Default session store of the server when no database is configured
pub mod memory {

    use super::*;
    use std::sync::Mutex;

    /// Sessions kept in memory, lost on restart
    ///
    /// Nothing is ever evicted: every client without a cookie adds a session, so memory use
    /// grows with the number of clients until the process restarts.
    #[derive(Default)]
    pub struct MemorySessionStore(Mutex<HashMap<String, Session>>);

    impl MemorySessionStore {
        pub fn new() -> MemorySessionStore {
            MemorySessionStore::default()
        }
    }

    impl SessionStore for MemorySessionStore {
        fn load(&self, id: &str) -> Result<Option<Session>> {
            let sessions = self
                .0
                .lock()
                .map_err(|err| Error::SessionUnavailable(err.to_string()))?;
            Ok(sessions.get(id).cloned())
        }

        fn save(&self, session: &Session) -> Result<()> {
            let mut sessions = self
                .0
                .lock()
                .map_err(|err| Error::SessionUnavailable(err.to_string()))?;
            sessions.insert(session.id.clone(), session.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemorySessionStore;
    use super::*;
    use crate::api::Item;

    #[test]
    fn test_new_sessions_have_distinct_ids() {
        let a = Session::new();
        let b = Session::new();
        assert_eq!(a.id.len(), 32);
        assert_ne!(a.id, b.id);
        assert!(a.values.is_empty());
    }

    #[test]
    fn test_basket_slot() {
        let mut session = Session::new();
        assert_eq!(session.basket().unwrap(), None);

        let mut basket = Basket::new("burger-joint", "alice");
        basket.add("burger-joint", Item::new("Burger", "5.00", "burger"));
        session.set_basket(&basket).unwrap();

        assert_eq!(session.basket().unwrap(), Some(basket));
    }

    #[test]
    fn test_slot_type_mismatch() {
        let mut session = Session::new();
        session.set(slots::BASKET, &"not a basket").unwrap();

        let err = session.basket().unwrap_err();
        match err.downcast_ref::<Error>() {
            Some(Error::SessionTypeMismatch(slot)) => assert_eq!(*slot, slots::BASKET),
            _ => panic!("Unexpected error {}", err),
        }
    }

    #[test]
    fn test_from_request() {
        let store = MemorySessionStore::new();
        let mut session = Session::new();
        session.set(slots::USERNAME, &"alice").unwrap();
        store.save(&session).unwrap();

        let request = Request::new(
            "GET",
            "/orders",
            vec![("Cookie".to_string(), format!("theme=dark; session={}", session.id))],
            "".to_string(),
        );
        assert_eq!(from_request(&store, &request).unwrap(), session);

        // Unknown or missing ids start a new session
        let request = Request::new(
            "GET",
            "/orders",
            vec![("Cookie".to_string(), "session=unknown".to_string())],
            "".to_string(),
        );
        let fresh = from_request(&store, &request).unwrap();
        assert_ne!(fresh.id, session.id);
        assert!(fresh.values.is_empty());

        let fresh = from_request(&store, &Request::get("/orders")).unwrap();
        assert!(fresh.values.is_empty());
    }

    #[test]
    fn test_cookie() {
        let session = Session {
            id: "abc".to_string(),
            values: HashMap::new(),
        };
        assert_eq!(session.cookie(), "session=abc; Path=/; HttpOnly");
    }
}
