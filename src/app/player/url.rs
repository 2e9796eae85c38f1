use crate::app::model::SourceLinkId;

use super::PlayerError;

/// Playback URL with exactly one purely numeric path segment standing in for
/// the source link id, e.g. `https://site.test/ru/play/0/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlayUrlTemplate {
    prefix: String,
    suffix: String,
}

impl PlayUrlTemplate {
    pub(crate) fn parse(raw: &str) -> Result<Self, PlayerError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PlayerError::MissingTemplate);
        }

        let path_end = raw.find(['?', '#']).unwrap_or(raw.len());
        let path_start = match raw[..path_end].find("://") {
            Some(scheme_end) => raw[scheme_end + 3..path_end]
                .find('/')
                .map(|idx| scheme_end + 3 + idx)
                .unwrap_or(path_end),
            None => 0,
        };

        let mut numeric = Vec::new();
        let mut offset = path_start;
        for segment in raw[path_start..path_end].split('/') {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                numeric.push((offset, offset + segment.len()));
            }
            offset += segment.len() + 1;
        }

        match numeric.as_slice() {
            [(start, end)] => Ok(Self {
                prefix: raw[..*start].to_string(),
                suffix: raw[*end..].to_string(),
            }),
            [] => Err(PlayerError::TemplateWithoutSlot(raw.to_string())),
            _ => Err(PlayerError::AmbiguousTemplate(raw.to_string())),
        }
    }

    /// Substitutes `link` into the numeric segment; a positive `resume_at`
    /// becomes the `start_from` query parameter.
    pub(crate) fn build(&self, link: &SourceLinkId, resume_at: Option<u32>) -> Result<String, PlayerError> {
        let id = link.as_str();
        if id.is_empty()
            || id
                .chars()
                .any(|ch| matches!(ch, '/' | '?' | '#' | '&') || ch.is_whitespace())
        {
            return Err(PlayerError::InvalidLinkId(id.to_string()));
        }

        let url = format!("{}{id}{}", self.prefix, self.suffix);
        let Some(seconds) = resume_at.filter(|seconds| *seconds > 0) else {
            return Ok(url);
        };

        let (base, fragment) = match url.find('#') {
            Some(idx) => url.split_at(idx),
            None => (url.as_str(), ""),
        };
        let separator = if base.ends_with('?') || base.ends_with('&') {
            ""
        } else if base.contains('?') {
            "&"
        } else {
            "?"
        };
        Ok(format!("{base}{separator}start_from={seconds}{fragment}"))
    }
}
