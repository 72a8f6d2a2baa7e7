use crate::error::GameError;

/// Identifies a live connection. It's the connection's slot in the network's table.
pub type ConnId = usize;

/// Who is logged in on which connection.
///
/// Kept in login order, which is the order `LOGGED` reports.
#[derive(Debug, Default)]
pub struct Sessions {
    entries: Vec<(ConnId, String)>,
}

impl Sessions {
    pub fn username(&self, conn: ConnId) -> Option<&str> {
        self.entries.iter().find(|(c, _)| *c == conn).map(|(_, name)| name.as_str())
    }
    pub fn connection_of(&self, username: &str) -> Option<ConnId> {
        self.entries.iter().find(|(_, name)| name == username).map(|(c, _)| *c)
    }
    /// Binds `username` to `conn`. A user holds at most one connection and a
    /// connection at most one user.
    pub fn login(&mut self, conn: ConnId, username: &str) -> Result<(), GameError> {
        if self.connection_of(username).is_some() {
            return Err(GameError::UserAlreadyLoggedIn);
        }
        if self.username(conn).is_some() {
            return Err(GameError::UnrecognisedCommand);
        }
        self.entries.push((conn, username.to_owned()));
        Ok(())
    }
    pub fn logout(&mut self, conn: ConnId) -> Option<String> {
        let pos = self.entries.iter().position(|(c, _)| *c == conn)?;
        Some(self.entries.remove(pos).1)
    }
    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, name)| name.as_str())
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_connection_per_user() {
        let mut sessions = Sessions::default();
        sessions.login(1, "bob").unwrap();
        assert_eq!(sessions.login(2, "bob"), Err(GameError::UserAlreadyLoggedIn));
        assert_eq!(sessions.connection_of("bob"), Some(1));
        assert_eq!(sessions.username(2), None);
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn one_user_per_connection() {
        let mut sessions = Sessions::default();
        sessions.login(1, "alice").unwrap();
        assert!(sessions.login(1, "bob").is_err());
        assert_eq!(sessions.username(1), Some("alice"));
    }

    #[test]
    fn logout_frees_the_username() {
        let mut sessions = Sessions::default();
        sessions.login(1, "alice").unwrap();
        sessions.login(2, "bob").unwrap();
        assert_eq!(sessions.logout(1), Some("alice".to_owned()));
        assert_eq!(sessions.logout(1), None);
        sessions.login(3, "alice").unwrap();
        assert_eq!(sessions.usernames().collect::<Vec<_>>(), ["bob", "alice"]);
    }
}
