use crate::api::GenerationConfig;

pub const DEFAULT_MODEL: &str = "gemini-flash-latest";
pub const KNOWN_MODELS: &[&str] = &["gemini-flash-latest", "gemini-pro-latest", "gemini-pro"];

pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);
pub const MAX_TOKENS_RANGE: (u32, u32) = (500, 4000);

// Fixed sampling parameters; only temperature is user-tunable.
const TOP_P: f64 = 0.95;
const TOP_K: u32 = 40;

/// The generation settings a conversation runs under. This is an immutable
/// value type: staged edits produce a new value, and the applied settings
/// only change through [`ChatSettings::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f64,
    pub max_output_tokens: u32,
    pub personality: String,
    pub streaming: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_output_tokens: 2000,
            personality: "friendly".to_string(),
            streaming: true,
        }
    }
}

/// Outcome of diffing a staged settings value against the applied one.
/// `changed` reports whether any generation-affecting field differs; the
/// streaming flag only alters delivery, so toggling it alone is not a
/// change worth reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDelta {
    pub changed: bool,
    pub next: ChatSettings,
}

impl ChatSettings {
    /// Pure apply: old x new -> {changed, next}. The caller commits `next`
    /// and rebuilds the live chat handle regardless of `changed`.
    pub fn apply(current: &ChatSettings, staged: &ChatSettings) -> SettingsDelta {
        let changed = current.personality != staged.personality
            || current.model != staged.model
            || current.temperature != staged.temperature
            || current.max_output_tokens != staged.max_output_tokens;

        SettingsDelta {
            changed,
            next: staged.clone(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens =
            max_output_tokens.clamp(MAX_TOKENS_RANGE.0, MAX_TOKENS_RANGE.1);
        self
    }

    pub fn with_personality(mut self, personality: impl Into<String>) -> Self {
        self.personality = personality.into();
        self
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: TOP_P,
            top_k: TOP_K,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_settings_apply_as_a_noop() {
        let current = ChatSettings::default();
        let delta = ChatSettings::apply(&current, &current.clone());
        assert!(!delta.changed);
        assert_eq!(delta.next, current);
    }

    #[test]
    fn generation_fields_mark_the_delta_changed() {
        let current = ChatSettings::default();

        for staged in [
            current.clone().with_model("gemini-pro"),
            current.clone().with_temperature(1.4),
            current.clone().with_max_output_tokens(3500),
            current.clone().with_personality("creative"),
        ] {
            assert!(ChatSettings::apply(&current, &staged).changed);
        }
    }

    #[test]
    fn streaming_alone_does_not_mark_the_delta_changed() {
        let current = ChatSettings::default();
        let staged = current.clone().with_streaming(false);
        let delta = ChatSettings::apply(&current, &staged);
        assert!(!delta.changed);
        assert!(!delta.next.streaming);
    }

    #[test]
    fn tunables_are_clamped_to_their_ranges() {
        let settings = ChatSettings::default()
            .with_temperature(5.0)
            .with_max_output_tokens(100);
        assert_eq!(settings.temperature, 2.0);
        assert_eq!(settings.max_output_tokens, 500);
    }

    #[test]
    fn generation_config_carries_fixed_sampling() {
        let config = ChatSettings::default().generation_config();
        assert_eq!(config.top_p, 0.95);
        assert_eq!(config.top_k, 40);
        assert_eq!(config.max_output_tokens, 2000);
    }
}
