use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const DEFAULT_EMOJI: &str = "🟦";

// Keys are lowercase; several model families spell the same emotion differently.
static EMOJI_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("joy", "😄"),
        ("happy", "😄"),
        ("sadness", "😢"),
        ("sad", "😢"),
        ("anger", "😡"),
        ("anger/annoyance", "😡"),
        ("disgust", "🤢"),
        ("fear", "😨"),
        ("surprise", "😲"),
        ("neutral", "😐"),
        ("love", "❤️"),
        ("enthusiasm", "🤩"),
    ])
});

/// Case-insensitive label lookup, falling back to [`DEFAULT_EMOJI`].
pub fn label_to_emoji(label: &str) -> &'static str {
    EMOJI_MAP
        .get(label.to_lowercase().as_str())
        .copied()
        .unwrap_or(DEFAULT_EMOJI)
}
