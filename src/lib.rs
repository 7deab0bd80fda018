//! The logfilter library: line selection and highlighting for log files.
//!
//! A run reads its whole input into memory, keeps the first or last N lines
//! if asked to, then passes each remaining line through up to three filters
//! (timestamp, IPv4, IPv6). Matched addresses are underlined in the output.
//!
//! # Examples
//!
//! ```rust,no_run
//! use logfilter::{Options, Pipeline};
//! use logfilter::input::split_lines;
//!
//! let mut options = Options::default();
//! options.ipv4 = true;
//!
//! let pipeline = Pipeline::new(options).unwrap();
//! let lines = split_lines(b"req from 192.168.1.5 ok\nno address\n");
//! let mut out = Vec::new();
//! pipeline.run(&lines, &mut out).unwrap();
//! assert_eq!(out, b"req from \x1b[4m192.168.1.5\x1b[0m ok\n");
//! ```

use std::io::Write;

use tracing::debug;

pub mod error;
pub mod input;
pub mod options;
pub mod pipeline;

pub use crate::error::{Error, Result};
pub use crate::options::Options;
pub use crate::pipeline::{Highlight, OutputMode, Pipeline, Summary};

/// Read the configured input, apply the bounds and filter every remaining line into `out`.
///
/// All input is read before anything is written, so an unreadable source
/// never produces partial output.
pub fn run<W: Write + ?Sized>(options: Options, out: &mut W) -> Result<Summary> {
    let pipeline = Pipeline::new(options)?;
    let options = pipeline.options();

    let lines = options.input.read_all_lines()?;
    let bounded = options.bounds.apply(&lines);
    debug!(
        input = %options.input,
        read = lines.len(),
        bounds = ?options.bounds,
        selected = bounded.len(),
        filters = options.has_filters(),
        "input loaded"
    );

    pipeline.run(bounded, out)
}
