//! URL helpers for building Gemini endpoints without doubled slashes.

/// Strip trailing slashes so endpoint joins stay predictable.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Build a model method endpoint, e.g.
/// `https://…/v1beta/models/gemini-pro:streamGenerateContent`.
pub fn model_endpoint(base_url: &str, model: &str, method: &str) -> String {
    format!("{}/models/{}:{}", normalize_base_url(base_url), model, method)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_are_stripped() {
        assert_eq!(
            normalize_base_url("https://generativelanguage.googleapis.com/v1beta/"),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(normalize_base_url("https://example.com///"), "https://example.com");
        assert_eq!(normalize_base_url(""), "");
    }

    #[test]
    fn model_endpoints_join_cleanly() {
        assert_eq!(
            model_endpoint(
                "https://generativelanguage.googleapis.com/v1beta/",
                "gemini-pro",
                "generateContent"
            ),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent"
        );
        assert_eq!(
            model_endpoint("http://127.0.0.1:8080", "stub", "streamGenerateContent"),
            "http://127.0.0.1:8080/models/stub:streamGenerateContent"
        );
    }
}
