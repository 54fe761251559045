use chrono::Local;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Role string the Gemini protocol expects. Assistant turns are
    /// model-authored on the wire.
    pub fn wire_role(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "model",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

/// One committed transcript entry. Immutable once appended to a session;
/// the timestamp is a pre-formatted local-time string, not a parseable
/// datetime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn user_now(content: impl Into<String>) -> Self {
        Self::new(Role::User, content, clock_stamp())
    }

    pub fn assistant_now(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content, clock_stamp())
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Wall-clock stamp shown next to messages, e.g. "03:41 PM".
pub fn clock_stamp() -> String {
    Local::now().format("%I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip_through_strings() {
        assert_eq!(Role::try_from("user"), Ok(Role::User));
        assert_eq!(Role::try_from("assistant"), Ok(Role::Assistant));
        assert!(Role::try_from("model").is_err());
    }

    #[test]
    fn assistant_maps_to_model_on_the_wire() {
        assert_eq!(Role::User.wire_role(), "user");
        assert_eq!(Role::Assistant.wire_role(), "model");
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let message = Message::new(Role::Assistant, "hi", "01:02 PM");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["timestamp"], "01:02 PM");
    }
}
