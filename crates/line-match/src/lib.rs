//! Timestamp and IP address matchers for single log lines.
//!
//! `line-match` answers three questions about a line of text, each by scanning
//! left to right and stopping at the first (leftmost) match:
//!
//! - does it contain an `HH:MM:SS` timestamp?
//! - where is its first dotted-decimal IPv4 address?
//! - where is its first full, uncompressed IPv6 address?
//!
//! All patterns are compiled once into a [`Matchers`] value which is then
//! shared, read-only, across every line.
//!
//! ## Quick Start
//!
//! ```no_run
//! use line_match::Matchers;
//!
//! # fn main() -> Result<(), line_match::Error> {
//! let matchers = Matchers::new()?;
//!
//! let line = b"12:00:01 accepted connection from 10.20.30.40 port 22";
//! assert!(matchers.contains_timestamp(line));
//!
//! let ip = matchers.extract_ipv4(line).unwrap();
//! assert_eq!(ip.as_str(), "10.20.30.40");
//! assert_eq!(ip.range(), 34..45);
//! # Ok(())
//! # }
//! ```
//!
//! ## Structured output
//!
//! Matches can be collected into a [`Tagged`] line and written as JSON:
//!
//! ```no_run
//! use line_match::{Matchers, Tag, Tagged};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let matchers = Matchers::new()?;
//! let line = b"client 192.168.1.5 ok";
//!
//! let mut tagged = Tagged::new(line);
//! if let Some(m) = matchers.extract_ipv4(line) {
//!     tagged = tagged.tag(Tag::from(m));
//! }
//! tagged.write_json(&mut std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::ops::Range;

use regex_automata::meta::Regex;
use regex_automata::util::primitives::NonMaxUsize;
use regex_automata::Input;
use regex_syntax::hir::Hir;
use serde::Serialize;

mod tag;
pub use tag::{Tag, Tagged};

/// `HH:MM:SS` with hour 00-23, minute and second 00-59. Not anchored.
static TIMESTAMP_PATTERN: &str = r"(?:[01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9]";

/// Four dotted octets in capture group 1, followed by a non-digit byte or the
/// end of the haystack. The delimiter is consumed but sits outside the group.
/// It is any byte, not any scalar, so non UTF-8 text after an address still ends it.
static IPV4_PATTERN: &str = r"((?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?))(?:(?-u:[^0-9])|$)";

/// Exactly eight hex groups; `::` shorthand never matches.
static IPV6_PATTERN: &str = r"(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}";

/// Error building one of the matchers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pattern text could not be parsed.
    #[error("invalid {kind} pattern")]
    Syntax {
        kind: MatchKind,
        #[source]
        source: Box<regex_syntax::Error>,
    },

    /// The parsed pattern could not be compiled into a regex.
    #[error("failed to build {kind} matcher")]
    Build {
        kind: MatchKind,
        #[source]
        source: regex_automata::meta::BuildError,
    },
}

/// Which matcher produced a [`Match`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Timestamp,
    Ipv4,
    Ipv6,
}

impl MatchKind {
    /// The separator byte every match of this kind must contain.
    #[inline(always)]
    fn required_byte(self) -> u8 {
        match self {
            MatchKind::Timestamp | MatchKind::Ipv6 => b':',
            MatchKind::Ipv4 => b'.',
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Timestamp => write!(f, "timestamp"),
            MatchKind::Ipv4 => write!(f, "IPv4"),
            MatchKind::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// A single match within a line.
///
/// The span is a byte range into the searched haystack, so the match can be
/// replaced in place without touching other occurrences of the same text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match<'h> {
    haystack: &'h [u8],
    start: usize,
    end: usize,
    kind: MatchKind,
}

impl<'h> Match<'h> {
    #[inline]
    fn new(haystack: &'h [u8], range: Range<usize>, kind: MatchKind) -> Match<'h> {
        Match {
            haystack,
            start: range.start,
            end: range.end,
            kind,
        }
    }

    /// Byte offset of the first byte of the match.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the last byte of the match.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The `[start, end)` byte range of the match.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matcher that found this match.
    #[inline]
    pub fn kind(&self) -> MatchKind {
        self.kind
    }

    /// The matched bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'h [u8] {
        &self.haystack[self.range()]
    }

    /// The matched text. Every pattern only matches ASCII, so this never loses data.
    #[inline]
    pub fn as_str(&self) -> &'h str {
        std::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

/// The compiled timestamp, IPv4 and IPv6 matchers.
///
/// Building a `Matchers` parses and compiles all three patterns; searching is
/// then allocation free.
#[derive(Clone, Debug)]
pub struct Matchers {
    timestamp: Regex,
    ipv4: Regex,
    ipv6: Regex,
}

impl Matchers {
    /// Compile all three matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to parse or compile. The patterns
    /// are fixed, so in practice this only fails on resource exhaustion.
    pub fn new() -> Result<Matchers, Error> {
        Ok(Matchers {
            timestamp: compile(MatchKind::Timestamp, TIMESTAMP_PATTERN)?,
            ipv4: compile(MatchKind::Ipv4, IPV4_PATTERN)?,
            ipv6: compile(MatchKind::Ipv6, IPV6_PATTERN)?,
        })
    }

    /// Whether the line contains a valid `HH:MM:SS` timestamp anywhere.
    ///
    /// ```no_run
    /// # let matchers = line_match::Matchers::new().unwrap();
    /// assert!(matchers.contains_timestamp(b"at 23:59:59 sharp"));
    /// assert!(!matchers.contains_timestamp(b"at 24:30:61"));
    /// ```
    #[inline]
    pub fn contains_timestamp(&self, line: &[u8]) -> bool {
        if memchr::memchr(MatchKind::Timestamp.required_byte(), line).is_none() {
            return false;
        }
        self.timestamp.is_match(line)
    }

    /// Find the leftmost `HH:MM:SS` timestamp in the line.
    #[inline]
    pub fn find_timestamp<'h>(&self, line: &'h [u8]) -> Option<Match<'h>> {
        if memchr::memchr(MatchKind::Timestamp.required_byte(), line).is_none() {
            return None;
        }
        let m = self.timestamp.find(line)?;
        Some(Match::new(line, m.range(), MatchKind::Timestamp))
    }

    /// Find the leftmost dotted-decimal IPv4 address in the line.
    ///
    /// An address directly followed by another digit is rejected outright
    /// rather than truncated, so `10.20.30.400` yields nothing instead of
    /// `10.20.30.40`.
    ///
    /// ```no_run
    /// # let matchers = line_match::Matchers::new().unwrap();
    /// let m = matchers.extract_ipv4(b"TEST10.20.30.40TEST").unwrap();
    /// assert_eq!(m.as_str(), "10.20.30.40");
    /// assert!(matchers.extract_ipv4(b"TEST10.20.30.400").is_none());
    /// ```
    #[inline]
    pub fn extract_ipv4<'h>(&self, line: &'h [u8]) -> Option<Match<'h>> {
        if memchr::memchr(MatchKind::Ipv4.required_byte(), line).is_none() {
            return None;
        }
        // slots 2 and 3 hold the start and end of group 1
        let mut slots: [Option<NonMaxUsize>; 4] = [None; 4];
        self.ipv4.search_slots(&Input::new(line), &mut slots)?;
        let start = slots[2]?.get();
        let end = slots[3]?.get();
        Some(Match::new(line, start..end, MatchKind::Ipv4))
    }

    /// Find the leftmost full eight-group IPv6 address in the line.
    ///
    /// Compressed forms such as `2001:db8::1` are not recognised.
    #[inline]
    pub fn extract_ipv6<'h>(&self, line: &'h [u8]) -> Option<Match<'h>> {
        if memchr::memchr(MatchKind::Ipv6.required_byte(), line).is_none() {
            return None;
        }
        let m = self.ipv6.find(line)?;
        Some(Match::new(line, m.range(), MatchKind::Ipv6))
    }

    /// Run the matcher for `kind` against the line.
    #[inline]
    pub fn find<'h>(&self, kind: MatchKind, line: &'h [u8]) -> Option<Match<'h>> {
        match kind {
            MatchKind::Timestamp => self.find_timestamp(line),
            MatchKind::Ipv4 => self.extract_ipv4(line),
            MatchKind::Ipv6 => self.extract_ipv6(line),
        }
    }
}

fn compile(kind: MatchKind, pattern: &str) -> Result<Regex, Error> {
    // haystacks are raw bytes, so patterns may match invalid UTF-8
    let hir: Hir = regex_syntax::ParserBuilder::new()
        .utf8(false)
        .build()
        .parse(pattern)
        .map_err(|source| Error::Syntax {
            kind,
            source: Box::new(source),
        })?;

    Regex::builder()
        .configure(
            Regex::config()
                .auto_prefilter(true)
                .utf8_empty(false)
                .match_kind(regex_automata::MatchKind::LeftmostFirst),
        )
        .build_from_hir(&hir)
        .map_err(|source| Error::Build { kind, source })
}
