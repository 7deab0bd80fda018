use std::io::Write;

use camino::Utf8PathBuf;
use logfilter::input::{split_lines, Bounds, FileOrStdin};
use logfilter::{Error, Highlight, Options, OutputMode, Pipeline};

// Test helper to write a log file and point the options at it
fn options_for(contents: &[u8]) -> (tempfile::NamedTempFile, Options) {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(contents).expect("Failed to write temp file");

    let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf()).expect("utf-8 temp path");
    let options = Options {
        input: FileOrStdin::from_path(path),
        ..Options::default()
    };
    (file, options)
}

fn run_to_string(options: Options) -> String {
    let mut out = Vec::new();
    logfilter::run(options, &mut out).expect("run succeeds");
    String::from_utf8(out).expect("utf-8 output")
}

const ACCESS_LOG: &[u8] = b"\
2024-03-01 08:15:02 GET / from 203.0.113.9\n\
2024-03-01 08:15:07 GET /health from 2001:db8:1:2:3:4:5:6\n\
startup complete\n\
2024-03-01 25:99:00 bad clock from 198.51.100.4\n\
2024-03-01 08:16:44 POST /login from 10.20.30.400\n";

#[test]
fn test_file_without_filters() {
    let (_file, options) = options_for(ACCESS_LOG);
    assert_eq!(run_to_string(options).as_bytes(), ACCESS_LOG);
}

#[test]
fn test_timestamp_and_ipv4() {
    let (_file, mut options) = options_for(ACCESS_LOG);
    options.timestamps = true;
    options.ipv4 = true;

    assert_eq!(
        run_to_string(options),
        "2024-03-01 08:15:02 GET / from \x1b[4m203.0.113.9\x1b[0m\n"
    );
}

#[test]
fn test_ipv6_only() {
    let (_file, mut options) = options_for(ACCESS_LOG);
    options.ipv6 = true;

    assert_eq!(
        run_to_string(options),
        "2024-03-01 08:15:07 GET /health from \x1b[4m2001:db8:1:2:3:4:5:6\x1b[0m\n"
    );
}

#[test]
fn test_last_lines_then_filter() {
    let (_file, mut options) = options_for(ACCESS_LOG);
    options.bounds = Bounds::Last(3);
    options.ipv4 = true;
    options.highlight = Highlight::Plain;

    // the 10.20.30.400 line is rejected, not truncated
    assert_eq!(
        run_to_string(options),
        "2024-03-01 25:99:00 bad clock from 198.51.100.4\n"
    );
}

#[test]
fn test_first_zero_prints_nothing() {
    let (_file, mut options) = options_for(ACCESS_LOG);
    options.bounds = Bounds::First(0);
    assert_eq!(run_to_string(options), "");
}

#[test]
fn test_json_mode() {
    let (_file, mut options) = options_for(b"from 1:2:3:4:5:6:7:8\n");
    options.ipv6 = true;
    options.output = OutputMode::Json;

    assert_eq!(
        run_to_string(options),
        "{\"tags\":[{\"kind\":\"ipv6\",\"value\":\"1:2:3:4:5:6:7:8\",\"range\":{\"start\":5,\"end\":20}}],\"data\":{\"text\":\"from 1:2:3:4:5:6:7:8\"}}\n"
    );
}

#[test]
fn test_crlf_terminators_are_preserved() {
    let (_file, mut options) = options_for(b"a 8.8.8.8\r\nb\r\n");
    options.ipv4 = true;
    assert_eq!(run_to_string(options), "a \x1b[4m8.8.8.8\x1b[0m\r\n");
}

#[test]
fn test_non_utf8_file_is_filtered_bytewise() {
    let (_file, mut options) = options_for(b"\xff\xfe 12:00:01 from 192.0.2.7\xa0\nlatin1 caf\xe9\n");
    options.timestamps = true;
    options.ipv4 = true;

    let mut out = Vec::new();
    logfilter::run(options, &mut out).expect("run succeeds");
    assert_eq!(out, b"\xff\xfe 12:00:01 from \x1b[4m192.0.2.7\x1b[0m\xa0\n");
}

#[test]
fn test_missing_file_is_input_error() {
    let options = Options {
        input: FileOrStdin::from_path(Utf8PathBuf::from("/nonexistent/logfilter/app.log")),
        ..Options::default()
    };
    let mut out = Vec::new();
    let err = logfilter::run(options, &mut out).unwrap_err();
    assert!(matches!(err, Error::InputOpen { .. }));
    assert!(out.is_empty());
}

#[test]
fn test_pipeline_reuse_across_inputs() {
    let options = Options {
        timestamps: true,
        ..Options::default()
    };
    let pipeline = Pipeline::new(options).expect("pipeline builds");

    for (input, expected) in [
        (&b"00:00:00\n"[..], "00:00:00\n"),
        (&b"24:30:61\n"[..], ""),
        (&b"x 23:59:59 y\nz\n"[..], "x 23:59:59 y\n"),
    ] {
        let lines = split_lines(input);
        let mut out = Vec::new();
        pipeline.run(&lines, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}
