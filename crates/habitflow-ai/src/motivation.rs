//! Parsing of generated motivation replies

use habitflow_models::Motivation;
use once_cell::sync::Lazy;
use regex::Regex;

static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\{.*\}").expect("motivation object pattern is valid")
});

/// Pull the structured motivation out of a model reply.
///
/// Models often wrap the object in prose or code fences, so the outermost
/// `{...}` span is parsed. Anything unparsable becomes the motivation text.
pub fn parse_motivation(content: &str) -> Motivation {
    JSON_OBJECT
        .find(content)
        .and_then(|found| serde_json::from_str::<Motivation>(found.as_str()).ok())
        .unwrap_or_else(|| Motivation::from_text(content))
}
