use camino::Utf8PathBuf;
use ripline::lines::LineIter;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};

use crate::error::{Error, Result};

/// A line of text read from input, numbered by its position in the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// 1-based position in the source.
    number: usize,
    /// The full line, including the line terminator.
    full: Vec<u8>,
}

impl Line {
    /// Create a new Line from a byte slice, expected to be a complete line.
    #[inline]
    pub fn new(number: usize, full: &[u8]) -> Line {
        Line {
            number,
            full: full.to_vec(),
        }
    }

    /// The 1-based position of this line in its source.
    #[inline]
    pub fn number(&self) -> usize {
        self.number
    }

    /// Get the full line, including the line terminator if present.
    #[inline]
    pub fn full(&self) -> &[u8] {
        &self.full
    }

    /// Get the content of the line, excluding the `\n` or `\r\n` terminator.
    #[inline]
    pub fn content(&self) -> &[u8] {
        let line = self.full.strip_suffix(b"\n").unwrap_or(self.full.as_slice());
        line.strip_suffix(b"\r").unwrap_or(line)
    }
}

/// Which slice of the input survives before filtering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bounds {
    /// Keep every line.
    #[default]
    All,
    /// Keep the first N lines.
    First(usize),
    /// Keep the last N lines.
    Last(usize),
}

impl Bounds {
    /// Build bounds from the optional `--first` and `--last` counts.
    ///
    /// At most one count may be given.
    pub fn from_counts(first: Option<usize>, last: Option<usize>) -> Result<Bounds> {
        match (first, last) {
            (Some(_), Some(_)) => Err(Error::ConflictingBounds),
            (Some(n), None) => Ok(Bounds::First(n)),
            (None, Some(n)) => Ok(Bounds::Last(n)),
            (None, None) => Ok(Bounds::All),
        }
    }

    /// Select the bounded slice of `lines`, preserving order.
    #[inline]
    pub fn apply<'a, T>(&self, lines: &'a [T]) -> &'a [T] {
        match *self {
            Bounds::All => lines,
            Bounds::First(n) => &lines[..n.min(lines.len())],
            Bounds::Last(n) => &lines[lines.len() - n.min(lines.len())..],
        }
    }
}

/// A source that can be either a file or stdin.
#[derive(Default, Clone, Debug)]
pub enum FileOrStdin {
    /// Input from a file.
    File(Utf8PathBuf),
    /// Input from stdin.
    #[default]
    Stdin,
}

impl fmt::Display for FileOrStdin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOrStdin::File(path) => write!(f, "{}", path),
            FileOrStdin::Stdin => write!(f, "<stdin>"),
        }
    }
}

impl FileOrStdin {
    /// Create a new FileOrStdin from a path.
    ///
    /// If the path is "-", stdin is used.
    pub fn from_path(path: Utf8PathBuf) -> Self {
        if path.as_str() == "-" {
            FileOrStdin::Stdin
        } else {
            FileOrStdin::File(path)
        }
    }

    /// Open the input source as a reader.
    pub fn reader(&self) -> Result<InputReader> {
        match self {
            FileOrStdin::File(path) => {
                let file = File::open(path).map_err(|source| Error::InputOpen {
                    path: path.clone(),
                    source,
                })?;
                Ok(InputReader::File(BufReader::new(file)))
            }
            FileOrStdin::Stdin => Ok(InputReader::Stdin(BufReader::new(io::stdin()))),
        }
    }

    /// Open the source, read every line and close it again.
    pub fn read_all_lines(&self) -> Result<Vec<Line>> {
        let mut reader = self.reader()?;
        reader.read_all_lines().map_err(|source| Error::InputRead {
            input: self.to_string(),
            source,
        })
    }
}

/// A reader for input from either a file or stdin.
pub enum InputReader {
    /// A reader for a file.
    File(BufReader<File>),
    /// A reader for stdin.
    Stdin(BufReader<io::Stdin>),
}

impl InputReader {
    /// Read the entire input into memory and split it into lines.
    ///
    /// The whole stream is buffered: `--last` needs the total line count
    /// before anything can be selected.
    pub fn read_all_lines(&mut self) -> io::Result<Vec<Line>> {
        let mut buf = Vec::with_capacity(65536);
        match self {
            InputReader::File(ref mut rdr) => rdr.read_to_end(&mut buf)?,
            InputReader::Stdin(ref mut rdr) => rdr.read_to_end(&mut buf)?,
        };
        Ok(split_lines(&buf))
    }
}

/// Split a buffer into lines, each keeping its terminator.
///
/// A final line without a terminator is kept as is; an empty buffer has no lines.
pub fn split_lines(buf: &[u8]) -> Vec<Line> {
    LineIter::new(b'\n', buf)
        .enumerate()
        .map(|(idx, line)| Line::new(idx + 1, line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_select_in_order() {
        let lines = [1, 2, 3, 4, 5];
        assert_eq!(Bounds::First(2).apply(&lines), &[1, 2]);
        assert_eq!(Bounds::Last(2).apply(&lines), &[4, 5]);
        assert_eq!(Bounds::All.apply(&lines), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn bounds_clamp_to_length() {
        let lines = [1, 2, 3];
        for n in 0..6 {
            let keep = n.min(lines.len());
            assert_eq!(Bounds::First(n).apply(&lines), &lines[..keep]);
            assert_eq!(Bounds::Last(n).apply(&lines), &lines[lines.len() - keep..]);
        }
    }

    #[test]
    fn zero_count_selects_nothing() {
        let lines = [1, 2, 3];
        assert!(Bounds::First(0).apply(&lines).is_empty());
        assert!(Bounds::Last(0).apply(&lines).is_empty());
    }

    #[test]
    fn empty_input() {
        let lines: [u32; 0] = [];
        assert!(Bounds::Last(3).apply(&lines).is_empty());
        assert!(Bounds::First(3).apply(&lines).is_empty());
    }

    #[test]
    fn from_counts_rejects_both() {
        assert!(matches!(
            Bounds::from_counts(Some(1), Some(1)),
            Err(Error::ConflictingBounds)
        ));
        assert_eq!(Bounds::from_counts(Some(3), None).unwrap(), Bounds::First(3));
        assert_eq!(Bounds::from_counts(None, Some(4)).unwrap(), Bounds::Last(4));
        assert_eq!(Bounds::from_counts(None, None).unwrap(), Bounds::All);
    }

    #[test]
    fn split_keeps_terminators() {
        let lines = split_lines(b"one\ntwo\r\nthree");
        let full: Vec<&[u8]> = lines.iter().map(Line::full).collect();
        assert_eq!(full, vec![&b"one\n"[..], &b"two\r\n"[..], &b"three"[..]]);
        assert_eq!(lines[1].content(), b"two");
        assert_eq!(lines[2].content(), b"three");
        assert_eq!(lines[2].number(), 3);
    }

    #[test]
    fn split_empty_buffer() {
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn missing_file_is_input_error() {
        let input = FileOrStdin::from_path(Utf8PathBuf::from("/nonexistent/logfilter/input.log"));
        assert!(matches!(
            input.read_all_lines(),
            Err(Error::InputOpen { .. })
        ));
    }

    #[test]
    fn dash_means_stdin() {
        assert!(matches!(
            FileOrStdin::from_path(Utf8PathBuf::from("-")),
            FileOrStdin::Stdin
        ));
        assert_eq!(FileOrStdin::Stdin.to_string(), "<stdin>");
    }
}
