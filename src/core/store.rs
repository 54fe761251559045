use crate::core::message::Message;

/// A named, independent conversation transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub name: String,
    pub messages: Vec<Message>,
}

impl Session {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            messages: Vec::new(),
        }
    }
}

/// All sessions for the running app, in creation order, with exactly one
/// current at any time. The active transcript always reads through
/// `sessions[current]`; there is no second copy to drift out of sync.
///
/// Sessions are created and cleared but never deleted.
pub struct SessionStore {
    sessions: Vec<Session>,
    current: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: vec![Session::new("Session 1")],
            current: 0,
        }
    }

    /// Create an empty session named `Session N` and make it current.
    pub fn create_session(&mut self) -> &str {
        let name = format!("Session {}", self.sessions.len() + 1);
        self.sessions.push(Session::new(name));
        self.current = self.sessions.len() - 1;
        &self.sessions[self.current].name
    }

    pub fn switch_session(&mut self, name: &str) -> Result<(), String> {
        match self.sessions.iter().position(|s| s.name == name) {
            Some(index) => {
                self.current = index;
                Ok(())
            }
            None => Err(format!("No session named '{name}'")),
        }
    }

    pub fn append_message(&mut self, name: &str, message: Message) -> Result<(), String> {
        match self.sessions.iter_mut().find(|s| s.name == name) {
            Some(session) => {
                session.messages.push(message);
                Ok(())
            }
            None => Err(format!("No session named '{name}'")),
        }
    }

    pub fn append_to_current(&mut self, message: Message) {
        self.sessions[self.current].messages.push(message);
    }

    /// Empty a session's transcript without touching the current pointer.
    pub fn clear_session(&mut self, name: &str) -> Result<(), String> {
        match self.sessions.iter_mut().find(|s| s.name == name) {
            Some(session) => {
                session.messages.clear();
                Ok(())
            }
            None => Err(format!("No session named '{name}'")),
        }
    }

    pub fn current_session(&self) -> &Session {
        &self.sessions[self.current]
    }

    pub fn current_name(&self) -> &str {
        &self.sessions[self.current].name
    }

    pub fn active_messages(&self) -> &[Message] {
        &self.sessions[self.current].messages
    }

    pub fn session(&self, name: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.name == name)
    }

    pub fn session_names(&self) -> impl Iterator<Item = &str> {
        self.sessions.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
