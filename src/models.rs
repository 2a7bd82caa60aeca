//! Normalized promotion record shared by every source adapter
//!
//! Adapters map their wire format into `Game`; everything downstream
//! (store, aggregator, notifier) only ever sees this shape.

use chrono::{DateTime, Utc};
use std::fmt;

/// A time-limited free-game promotion
///
/// Identity is the `(title, platform)` pair. Two records with the same pair
/// are the same promotion even if the other fields differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub title: String,
    /// Redemption page
    pub url: String,
    /// Source identifier, e.g. "Steam" or "Epic Games"
    pub platform: String,
    /// Promotion expiry (UTC), when the source exposes one
    pub end_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    /// Not rendered in notifications
    pub image_url: Option<String>,
}

impl Game {
    pub fn new(title: impl Into<String>, url: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            platform: platform.into(),
            end_date: None,
            description: None,
            image_url: None,
        }
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Render the MarkdownV2 notification text
    ///
    /// Same template for subscribe listings, on-demand checks and timer ticks.
    /// Empty descriptions are treated as absent. Every storefront-supplied
    /// field is escaped, so a stray `_` or `*` in a title cannot break parsing.
    pub fn to_message(&self) -> String {
        let mut message = format!("🎮 *{}*\n", escape_markdown(&self.title));
        message.push_str(&format!("🎯 Platform: {}\n", escape_markdown(&self.platform)));

        if let Some(description) = self.description.as_deref().filter(|d| !d.trim().is_empty()) {
            message.push_str(&format!("📝 {}\n", escape_markdown(description.trim())));
        }

        if let Some(end_date) = self.end_date {
            let until = end_date.format("%Y-%m-%d %H:%M UTC").to_string();
            message.push_str(&format!("⏰ Available until: {}\n", escape_markdown(&until)));
        }

        message.push_str(&format!("🔗 [Get it here]({})", escape_link_target(&self.url)));
        message
    }
}

/// Characters MarkdownV2 reserves in running text
const MARKDOWN_RESERVED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Backslash-escape every MarkdownV2 reserved character
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_RESERVED.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Inside `(...)` of an inline link only `)` and `\` need escaping
fn escape_link_target(url: &str) -> String {
    url.replace('\\', "\\\\").replace(')', "\\)")
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.platform)
    }
}

/// Opaque notification target
///
/// For the Telegram transport this is the chat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecipientId(pub i64);

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_with_all_fields() {
        let game = Game::new("Celeste", "https://store.epicgames.com/p/celeste", "Epic Games")
            .with_description("Climb the mountain.")
            .with_end_date(Utc.with_ymd_and_hms(2024, 1, 11, 16, 0, 0).unwrap());

        assert_eq!(
            game.to_message(),
            "🎮 *Celeste*\n\
             🎯 Platform: Epic Games\n\
             📝 Climb the mountain\\.\n\
             ⏰ Available until: 2024\\-01\\-11 16:00 UTC\n\
             🔗 [Get it here](https://store.epicgames.com/p/celeste)"
        );
    }

    #[test]
    fn test_message_without_optional_fields() {
        let game = Game::new("Portal", "https://store.steampowered.com/app/400", "Steam")
            .with_description("   ");

        let message = game.to_message();
        assert_eq!(
            message,
            "🎮 *Portal*\n🎯 Platform: Steam\n🔗 [Get it here](https://store.steampowered.com/app/400)"
        );
        assert!(!message.contains("📝"));
        assert!(!message.contains("⏰"));
    }

    #[test]
    fn test_image_url_not_rendered() {
        let game = Game::new("Portal", "https://example.com", "Steam")
            .with_image_url("https://cdn.example.com/portal.jpg");
        assert!(!game.to_message().contains("cdn.example.com"));
    }

    #[test]
    fn test_reserved_characters_escaped() {
        let game = Game::new(
            "Tom_Clancy's *Rainbow* [Six] v1.0!",
            "https://example.com/app/(1)",
            "Steam",
        )
        .with_description("50% off_ends #soon");

        let message = game.to_message();
        assert!(message.starts_with("🎮 *Tom\\_Clancy's \\*Rainbow\\* \\[Six\\] v1\\.0\\!*\n"));
        assert!(message.contains("📝 50% off\\_ends \\#soon\n"));
        assert!(message.ends_with("[Get it here](https://example.com/app/(1\\))"));
    }

    #[test]
    fn test_escape_markdown_leaves_plain_text() {
        assert_eq!(escape_markdown("Portal 2"), "Portal 2");
        assert_eq!(escape_markdown("a\\b"), "a\\\\b");
    }
}
