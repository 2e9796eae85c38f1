use std::fmt;

use serde_json::Value;

/// Trims and renders plain integer numerals in canonical form so that `610`,
/// `"610"`, `"0610"` and `" 610.0 "` all land on the same key. Anything else
/// (exponents, real fractions, words) is kept verbatim.
pub(crate) fn canonical_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return String::new();
    }
    plain_integer(trimmed).unwrap_or_else(|| trimmed.to_string())
}

/// `[+-]?digits(.0+)?` with leading zeros and the sign of zero dropped.
fn plain_integer(text: &str) -> Option<String> {
    let (negative, unsigned) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (digits, fraction) = match unsigned.split_once('.') {
        Some((digits, fraction)) => (digits, Some(fraction)),
        None => (unsigned, None),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction
        && (fraction.is_empty() || !fraction.bytes().all(|b| b == b'0'))
    {
        return None;
    }

    let magnitude = digits.trim_start_matches('0');
    if magnitude.is_empty() {
        return Some("0".to_string());
    }
    Some(if negative {
        format!("-{magnitude}")
    } else {
        magnitude.to_string()
    })
}

fn number_id(number: &serde_json::Number) -> String {
    if let Some(value) = number.as_i64() {
        return value.to_string();
    }
    if let Some(value) = number.as_u64() {
        return value.to_string();
    }
    match number.as_f64() {
        Some(value) if value.fract() == 0.0 && value.abs() < 9.0e15 => {
            (value as i64).to_string()
        }
        _ => number.to_string(),
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub(crate) struct $name(String);

        impl $name {
            pub(crate) fn new(raw: &str) -> Option<Self> {
                let canonical = canonical_id(raw);
                (!canonical.is_empty()).then_some(Self(canonical))
            }

            pub(crate) fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::String(text) => Self::new(text),
                    Value::Number(number) => Self::new(&number_id(number)),
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
    ($(#[$meta:meta])* $name:ident, borrowed) => {
        string_id!($(#[$meta])* $name);

        impl $name {
            pub(crate) fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// The media item a session belongs to. Scopes every per-item preference.
    MediaId
);
string_id!(EpisodeId, borrowed);
string_id!(SeasonId);
string_id!(SourceLinkId, borrowed);
string_id!(TranslationId, borrowed);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Episode {
    pub(crate) id: EpisodeId,
    pub(crate) number: u32,
    pub(crate) season: SeasonId,
    pub(crate) title: Option<String>,
}

impl Episode {
    pub(crate) fn label(&self) -> String {
        match self.title.as_deref() {
            Some(title) => format!("Episode {}: {title}", self.number),
            None => format!("Episode {}", self.number),
        }
    }
}

/// One position of a season pane. Spacers pad the grid and are never selectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Episode(Episode),
    Spacer,
}

impl Slot {
    pub(crate) fn episode(&self) -> Option<&Episode> {
        match self {
            Self::Episode(episode) => Some(episode),
            Self::Spacer => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Season {
    pub(crate) id: SeasonId,
    pub(crate) number: i32,
    pub(crate) title: Option<String>,
    pub(crate) slots: Vec<Slot>,
}

impl Season {
    pub(crate) fn label(&self) -> String {
        if let Some(title) = self.title.as_deref() {
            return title.to_string();
        }
        match self.number {
            0 => "OVA/Movie".to_string(),
            -1 => "Specials".to_string(),
            number => format!("Season {number}"),
        }
    }

    pub(crate) fn episodes(&self) -> impl DoubleEndedIterator<Item = &Episode> {
        self.slots.iter().filter_map(Slot::episode)
    }

    pub(crate) fn first_episode(&self) -> Option<&Episode> {
        self.episodes().next()
    }

    pub(crate) fn last_episode(&self) -> Option<&Episode> {
        self.episodes().next_back()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SourceContext {
    /// The media item itself, used by the player-only layout.
    Main,
    Episode(EpisodeId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLink {
    pub(crate) id: SourceLinkId,
    pub(crate) context: SourceContext,
    pub(crate) translation: Option<TranslationId>,
    pub(crate) title: String,
    pub(crate) quality: Option<String>,
    pub(crate) resume_at: Option<u32>,
}

impl SourceLink {
    pub(crate) fn button_label(&self) -> String {
        match self.quality.as_deref() {
            Some(quality) => format!("{} ({quality})", self.title),
            None => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) enum LayoutMode {
    #[default]
    EpisodesBelow,
    EpisodesRight,
    PlayerOnly,
}

impl LayoutMode {
    pub(crate) const ALL: [LayoutMode; 3] = [
        LayoutMode::EpisodesBelow,
        LayoutMode::EpisodesRight,
        LayoutMode::PlayerOnly,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::EpisodesBelow => "episodes_below",
            Self::EpisodesRight => "episodes_right",
            Self::PlayerOnly => "player_only",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "episodes_below" => Some(Self::EpisodesBelow),
            "episodes_right" => Some(Self::EpisodesRight),
            "player_only" => Some(Self::PlayerOnly),
            _ => None,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::EpisodesBelow => "EPISODES BELOW",
            Self::EpisodesRight => "EPISODES RIGHT",
            Self::PlayerOnly => "PLAYER ONLY",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named pane of the item's detail area ("watch", "info", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct DetailTab(String);

impl DetailTab {
    pub(crate) const WATCH: &'static str = "watch";
    pub(crate) const INFO: &'static str = "info";

    pub(crate) fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub(crate) fn watch() -> Self {
        Self(Self::WATCH.to_string())
    }

    pub(crate) fn info() -> Self {
        Self(Self::INFO.to_string())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_watch(&self) -> bool {
        self.0 == Self::WATCH
    }
}

impl fmt::Display for DetailTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_id_unifies_numeric_and_string_forms() {
        assert_eq!(canonical_id("610"), "610");
        assert_eq!(canonical_id(" 610 "), "610");
        assert_eq!(canonical_id("610.0"), "610");
        assert_eq!(canonical_id("abc-1"), "abc-1");
        assert_eq!(canonical_id("  "), "");
        assert_eq!(canonical_id("null"), "");
    }

    #[test]
    fn canonical_id_only_normalizes_plain_integers() {
        assert_eq!(canonical_id("007"), "7");
        assert_eq!(canonical_id("7.00"), "7");
        assert_eq!(canonical_id("+12"), "12");
        assert_eq!(canonical_id("-0"), "0");
        assert_eq!(canonical_id("-05"), "-5");
        assert_eq!(canonical_id("1e3"), "1e3");
        assert_eq!(canonical_id("7.0000001"), "7.0000001");
        assert_eq!(canonical_id("7."), "7.");
        assert_eq!(canonical_id(".5"), ".5");
        assert_eq!(canonical_id("-"), "-");
    }

    #[test]
    fn json_numbers_keep_real_fractions() {
        let whole = SourceLinkId::from_value(&serde_json::json!(5001.0));
        assert_eq!(whole.as_ref().map(SourceLinkId::as_str), Some("5001"));
        let fractional = SourceLinkId::from_value(&serde_json::json!(7.5));
        assert_eq!(fractional.as_ref().map(SourceLinkId::as_str), Some("7.5"));
        let exponent = SourceLinkId::new("1e3");
        assert_eq!(exponent.as_ref().map(SourceLinkId::as_str), Some("1e3"));
    }

    #[test]
    fn ids_from_json_numbers_and_strings_compare_equal() {
        let from_number = TranslationId::from_value(&serde_json::json!(610));
        let from_string = TranslationId::from_value(&serde_json::json!("610"));
        assert!(from_number.is_some());
        assert_eq!(from_number, from_string);
        assert!(TranslationId::from_value(&serde_json::json!(null)).is_none());
    }

    #[test]
    fn season_labels_follow_special_numbers() {
        let season = |number| Season {
            id: SeasonId::new("1").expect("id"),
            number,
            title: None,
            slots: Vec::new(),
        };
        assert_eq!(season(0).label(), "OVA/Movie");
        assert_eq!(season(-1).label(), "Specials");
        assert_eq!(season(3).label(), "Season 3");
    }

    #[test]
    fn layout_mode_parses_its_storage_form() {
        for mode in LayoutMode::ALL {
            assert_eq!(LayoutMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(LayoutMode::parse("sideways"), None);
    }
}
