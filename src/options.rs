use crate::input::{Bounds, FileOrStdin};
use crate::pipeline::{Highlight, OutputMode};

/// Everything one run needs to know, resolved once from the command line.
#[derive(Clone, Debug, Default)]
pub struct Options {
    /// Where lines are read from.
    pub input: FileOrStdin,
    /// First/last truncation, applied before any filter.
    pub bounds: Bounds,
    /// Keep only lines containing an `HH:MM:SS` timestamp.
    pub timestamps: bool,
    /// Keep only lines containing an IPv4 address.
    pub ipv4: bool,
    /// Keep only lines containing a full IPv6 address.
    pub ipv6: bool,
    /// How matched addresses are marked in text output.
    pub highlight: Highlight,
    /// Plain lines or JSON tags.
    pub output: OutputMode,
}

impl Options {
    /// Whether any line filter is active.
    #[inline]
    pub fn has_filters(&self) -> bool {
        self.timestamps || self.ipv4 || self.ipv6
    }
}
