use bstr::ByteSlice;
use std::borrow::Cow;
use std::io::Write;
use std::ops::Range;
use termcolor::ColorChoice;
use tracing::{debug, trace};

use line_match::{MatchKind, Matchers, Tag, Tagged};

use crate::error::Result;
use crate::input::Line;
use crate::options::Options;

/// Escape sequence that starts underlined text.
pub const UNDERLINE: &[u8] = b"\x1b[4m";
/// Escape sequence that resets all text attributes.
pub const RESET: &[u8] = b"\x1b[0m";

/// How a matched address is marked in text output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Highlight {
    /// Wrap the match in underline escapes.
    #[default]
    Underline,
    /// Leave the line untouched.
    Plain,
}

impl Highlight {
    /// Mark `range` of `line`, returning the line unchanged for `Plain`.
    #[inline]
    pub fn apply<'a>(&self, line: Cow<'a, [u8]>, range: Range<usize>) -> Cow<'a, [u8]> {
        match self {
            Highlight::Plain => line,
            Highlight::Underline => {
                let mut out = Vec::with_capacity(line.len() + UNDERLINE.len() + RESET.len());
                out.extend_from_slice(&line[..range.start]);
                out.extend_from_slice(UNDERLINE);
                out.extend_from_slice(&line[range.clone()]);
                out.extend_from_slice(RESET);
                out.extend_from_slice(&line[range.end..]);
                Cow::Owned(out)
            }
        }
    }
}

impl From<ColorChoice> for Highlight {
    fn from(choice: ColorChoice) -> Highlight {
        match choice {
            ColorChoice::Never => Highlight::Plain,
            _ => Highlight::Underline,
        }
    }
}

/// What is written for each surviving line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// The line itself, highlighted, with its original terminator.
    #[default]
    Text,
    /// One JSON object per line listing the matches.
    Json,
}

/// Counts gathered over one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Lines handed to the pipeline after bounds were applied.
    pub selected: usize,
    /// Lines written to the output.
    pub emitted: usize,
}

impl Summary {
    /// Lines removed by a filter.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.selected - self.emitted
    }
}

/// Per-line filtering and highlighting.
///
/// Filters run in a fixed order: timestamp, IPv4, IPv6. A line missing any
/// active match is dropped. The IPv6 search sees the line as already
/// highlighted by the IPv4 step.
#[derive(Clone, Debug)]
pub struct Pipeline {
    options: Options,
    matchers: Matchers,
}

impl Pipeline {
    /// Build a pipeline, compiling the matchers once.
    pub fn new(options: Options) -> Result<Pipeline> {
        let matchers = Matchers::new()?;
        Ok(Pipeline { options, matchers })
    }

    /// The options this pipeline was built with.
    #[inline]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Filter and highlight a single line for text output.
    ///
    /// Returns `None` if the line is dropped. The line terminator, if any, is
    /// carried through untouched.
    pub fn filter_line<'a>(&self, line: &'a [u8]) -> Option<Cow<'a, [u8]>> {
        let mut output = Cow::Borrowed(line);

        if self.options.timestamps && !self.matchers.contains_timestamp(&output) {
            return None;
        }

        if self.options.ipv4 {
            let range = self.matchers.extract_ipv4(&output)?.range();
            output = self.options.highlight.apply(output, range);
        }

        if self.options.ipv6 {
            let range = self.matchers.extract_ipv6(&output)?.range();
            output = self.options.highlight.apply(output, range);
        }

        Some(output)
    }

    /// Filter a single line for JSON output, collecting one tag per active filter.
    pub fn tag_line(&self, line: &Line) -> Option<Tagged> {
        let text = line.full();
        let mut tagged = Tagged::new(line.content());

        let active = [
            (self.options.timestamps, MatchKind::Timestamp),
            (self.options.ipv4, MatchKind::Ipv4),
            (self.options.ipv6, MatchKind::Ipv6),
        ];
        for (enabled, kind) in active {
            if enabled {
                let m = self.matchers.find(kind, text)?;
                tagged = tagged.tag(Tag::from(m));
            }
        }

        Some(tagged)
    }

    /// Run every line through the filters and write the survivors to `out`.
    pub fn run<W: Write + ?Sized>(&self, lines: &[Line], out: &mut W) -> Result<Summary> {
        let mut summary = Summary {
            selected: lines.len(),
            emitted: 0,
        };

        for line in lines {
            let written = match self.options.output {
                OutputMode::Text => match self.filter_line(line.full()) {
                    Some(output) => {
                        out.write_all(&output)?;
                        true
                    }
                    None => false,
                },
                OutputMode::Json => match self.tag_line(line) {
                    Some(mut tagged) => {
                        tagged.write_json(out)?;
                        out.write_all(b"\n")?;
                        true
                    }
                    None => false,
                },
            };

            if written {
                summary.emitted += 1;
            } else {
                trace!(line = line.number(), text = %line.content().as_bstr(), "dropped");
            }
        }

        debug!(
            selected = summary.selected,
            emitted = summary.emitted,
            dropped = summary.dropped(),
            "filtering finished"
        );
        Ok(summary)
    }
}
