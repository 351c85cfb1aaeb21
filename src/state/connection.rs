//! Connection tracking.
//!
//! Maps transport connections to the session they joined. A connection
//! belongs to at most one session at a time.

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Transport-assigned connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// State for a single connection.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,

    /// Session joined or being joined, if any
    pub session_id: Option<String>,

    /// Last inbound event
    pub last_activity: Instant,

    /// Outbound messages addressed to this connection
    pub messages_sent: u64,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            session_id: None,
            last_activity: Instant::now(),
            messages_sent: 0,
        }
    }

    /// Record activity (any event received).
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

/// Connection manager - tracks all open connections.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: HashMap<ConnectionId, Connection>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or start tracking a connection and record activity on it.
    pub fn touch(&mut self, id: ConnectionId) -> &mut Connection {
        let conn = self
            .connections
            .entry(id)
            .or_insert_with(|| Connection::new(id));
        conn.touch();
        conn
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Session a connection has joined.
    pub fn session_of(&self, id: ConnectionId) -> Option<&str> {
        self.connections
            .get(&id)
            .and_then(|c| c.session_id.as_deref())
    }

    /// Claim a session for a connection.
    ///
    /// Fails if the connection is already bound, so a connection sits in at
    /// most one session even while a join is still in flight.
    pub fn try_bind(&mut self, id: ConnectionId, session_id: &str) -> bool {
        let conn = self.touch(id);
        if conn.session_id.is_some() {
            return false;
        }
        conn.session_id = Some(session_id.to_string());
        true
    }

    /// Clear a connection's session binding.
    pub fn unbind(&mut self, id: ConnectionId) {
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.session_id = None;
        }
    }

    /// Clear every binding to a session that no longer exists.
    pub fn unbind_session(&mut self, session_id: &str) -> Vec<ConnectionId> {
        let mut released: Vec<ConnectionId> = self
            .connections
            .values_mut()
            .filter(|c| c.session_id.as_deref() == Some(session_id))
            .map(|c| {
                c.session_id = None;
                c.id
            })
            .collect();
        released.sort();
        released
    }

    /// Count an outbound message for each recipient.
    pub fn record_sent(&mut self, recipients: &[ConnectionId]) {
        for id in recipients {
            if let Some(conn) = self.connections.get_mut(id) {
                conn.messages_sent += 1;
            }
        }
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_lookup() {
        let mut manager = ConnectionManager::new();
        manager.touch(ConnectionId(1));
        assert_eq!(manager.session_of(ConnectionId(1)), None);

        assert!(manager.try_bind(ConnectionId(1), "game-1"));
        assert_eq!(manager.session_of(ConnectionId(1)), Some("game-1"));

        // One session at a time
        assert!(!manager.try_bind(ConnectionId(1), "game-2"));
        assert_eq!(manager.session_of(ConnectionId(1)), Some("game-1"));

        manager.unbind(ConnectionId(1));
        assert_eq!(manager.session_of(ConnectionId(1)), None);
        assert!(manager.try_bind(ConnectionId(1), "game-2"));
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_unbind_session() {
        let mut manager = ConnectionManager::new();
        manager.try_bind(ConnectionId(3), "game-1");
        manager.try_bind(ConnectionId(1), "game-1");
        manager.try_bind(ConnectionId(2), "game-2");

        let released = manager.unbind_session("game-1");
        assert_eq!(released, vec![ConnectionId(1), ConnectionId(3)]);
        assert_eq!(manager.session_of(ConnectionId(1)), None);
        assert_eq!(manager.session_of(ConnectionId(2)), Some("game-2"));
    }

    #[test]
    fn test_record_sent() {
        let mut manager = ConnectionManager::new();
        manager.touch(ConnectionId(1));
        manager.touch(ConnectionId(2));

        manager.record_sent(&[ConnectionId(1), ConnectionId(2), ConnectionId(3)]);
        manager.record_sent(&[ConnectionId(1)]);

        assert_eq!(manager.get(ConnectionId(1)).unwrap().messages_sent, 2);
        assert_eq!(manager.get(ConnectionId(2)).unwrap().messages_sent, 1);
        assert!(manager.get(ConnectionId(3)).is_none());
    }

    #[test]
    fn test_remove() {
        let mut manager = ConnectionManager::new();
        manager.try_bind(ConnectionId(7), "game-1");

        let conn = manager.remove(ConnectionId(7)).unwrap();
        assert_eq!(conn.session_id.as_deref(), Some("game-1"));
        assert!(manager.get(ConnectionId(7)).is_none());
    }
}
