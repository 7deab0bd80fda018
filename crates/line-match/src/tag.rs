use serde::Serialize;
use std::io::{self, Write};
use std::ops::Range;

use crate::{Match, MatchKind};

/// A match found in a line, in a form suitable for serialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// The matcher that produced the tag.
    kind: MatchKind,
    /// The matched text.
    value: String,
    /// The byte range in the original line where the match was found.
    range: Range<usize>,
}

impl Tag {
    /// Create a new tag from its parts.
    #[inline]
    pub fn new<S: Into<String>>(kind: MatchKind, value: S, range: Range<usize>) -> Tag {
        Tag {
            kind,
            value: value.into(),
            range,
        }
    }

    /// The matcher that produced the tag.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    /// The matched text.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The byte range of the match in the original line.
    #[inline]
    #[must_use]
    pub fn range(&self) -> &Range<usize> {
        &self.range
    }
}

impl From<Match<'_>> for Tag {
    fn from(m: Match<'_>) -> Tag {
        Tag::new(m.kind(), m.as_str(), m.range())
    }
}

/// A line of text together with the tags found in it.
#[derive(Clone, Debug, Serialize)]
pub struct Tagged {
    /// The original text.
    #[serde(skip_serializing)]
    text: Vec<u8>,
    /// The tags found in the text, in the order they were added.
    tags: Vec<Tag>,
    /// The original text as a string (for JSON serialization).
    #[serde(rename = "data")]
    text_data: Option<TextData>,
}

/// Represents the text data for JSON serialization.
#[derive(Clone, Debug, Serialize)]
struct TextData {
    /// The original text as a string.
    text: String,
}

impl Tagged {
    /// Create a new `Tagged` container for a line of text.
    #[inline]
    #[must_use]
    pub fn new(text: &[u8]) -> Tagged {
        Tagged {
            text: text.to_vec(),
            // a line carries at most one tag per matcher
            tags: Vec::with_capacity(3),
            text_data: None,
        }
    }

    /// Adds a tag to this text.
    #[inline]
    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Get the tags in this text.
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Get the original text.
    #[inline]
    #[must_use]
    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Writes the `Tagged` object as a single JSON object, without a trailing newline.
    ///
    /// Non UTF-8 text is converted lossily; tag ranges always refer to the
    /// original bytes.
    #[inline]
    pub fn write_json<W: Write + ?Sized>(&mut self, wtr: &mut W) -> io::Result<()> {
        if self.text_data.is_none() {
            self.text_data = Some(TextData {
                text: String::from_utf8_lossy(&self.text).into_owned(),
            });
        }

        serde_json::to_writer(wtr, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_layout() {
        let mut tagged = Tagged::new(b"from 1.2.3.4").tag(Tag::new(MatchKind::Ipv4, "1.2.3.4", 5..12));
        let mut out = Vec::new();
        tagged.write_json(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"{"tags":[{"kind":"ipv4","value":"1.2.3.4","range":{"start":5,"end":12}}],"data":{"text":"from 1.2.3.4"}}"#
        );
    }

    #[test]
    fn invalid_utf8_is_lossy() {
        let mut tagged = Tagged::new(b"a\xffb");
        let mut out = Vec::new();
        tagged.write_json(&mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("a\u{FFFD}b"));
        assert_eq!(tagged.text(), b"a\xffb");
    }
}
