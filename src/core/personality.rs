/// A named system-prompt preset shaping the model's tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Personality {
    pub id: &'static str,
    pub prompt: &'static str,
}

const PERSONALITIES: &[Personality] = &[
    Personality {
        id: "friendly",
        prompt: "You are a helpful, friendly, and warm AI assistant. Use emojis \
                 occasionally and be conversational. Keep responses concise but \
                 informative.",
    },
    Personality {
        id: "professional",
        prompt: "You are a professional AI assistant. Provide clear, concise, and \
                 formal responses. Maintain a business-like tone.",
    },
    Personality {
        id: "casual",
        prompt: "You are a casual, laid-back AI assistant. Chat like a friend - be \
                 relaxed, use casual language, and keep things fun and light.",
    },
    Personality {
        id: "creative",
        prompt: "You are a creative and imaginative AI assistant. Think outside the \
                 box, use metaphors, and make your responses engaging and colorful.",
    },
    Personality {
        id: "technical",
        prompt: "You are a technical AI assistant with expertise in technology and \
                 programming. Provide detailed, accurate technical information when \
                 relevant.",
    },
];

pub fn all_personalities() -> &'static [Personality] {
    PERSONALITIES
}

pub fn find_personality(id: &str) -> Option<&'static Personality> {
    PERSONALITIES
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
}

/// Look up the system prompt for a personality id. The selection surface is
/// closed, so an unknown id only occurs through config edits or command
/// typos; the error lists what would have been accepted.
pub fn lookup_prompt(id: &str) -> Result<&'static str, String> {
    match find_personality(id) {
        Some(personality) => Ok(personality.prompt),
        None => {
            let available: Vec<&str> = PERSONALITIES.iter().map(|p| p.id).collect();
            Err(format!(
                "Personality '{}' not found. Available personalities: {}",
                id,
                available.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_the_builtin_presets() {
        let ids: Vec<&str> = all_personalities().iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            ["friendly", "professional", "casual", "creative", "technical"]
        );
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(
            lookup_prompt("Friendly").unwrap(),
            lookup_prompt("friendly").unwrap()
        );
    }

    #[test]
    fn unknown_ids_list_the_alternatives() {
        let err = lookup_prompt("sarcastic").unwrap_err();
        assert!(err.contains("sarcastic"));
        assert!(err.contains("friendly"));
        assert!(err.contains("technical"));
    }
}
