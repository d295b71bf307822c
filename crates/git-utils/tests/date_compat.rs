//! Date compatibility tests comparing our parsing/formatting with C git behavior.

use bstr::BStr;
use git_utils::date::{DateFormat, GitDate, Signature};

/// Verify raw format round-trips correctly.
#[test]
fn raw_format_roundtrip() {
    let inputs = [
        "1234567890 +0000",
        "1234567890 -0500",
        "1234567890 +0530",
        "0 +0000",
        "1700000000 +1200",
        "1700000000 -1100",
    ];

    for input in inputs {
        let date = GitDate::parse_raw(input).unwrap();
        let reparsed = GitDate::parse_raw(&date.format(DateFormat::Raw)).unwrap();

        assert_eq!(date.timestamp, reparsed.timestamp, "timestamp mismatch for input: {input}");
        assert_eq!(date.tz_offset, reparsed.tz_offset, "tz_offset mismatch for input: {input}");
    }
}

/// Verify signature round-trips through parse -> to_bytes -> parse.
#[test]
fn signature_roundtrip() {
    let inputs = [
        "John Doe <john@example.com> 1234567890 +0000",
        "Jane Smith <jane@test.org> 1700000000 -0500",
        "A B C <abc@d.e> 0 +0000",
    ];

    for input in inputs {
        let sig = Signature::parse(BStr::new(input.as_bytes())).unwrap();
        let reparsed = Signature::parse(BStr::new(&sig.to_bytes())).unwrap();

        assert_eq!(sig.name, reparsed.name, "name mismatch for: {input}");
        assert_eq!(sig.email, reparsed.email, "email mismatch for: {input}");
        assert_eq!(sig.date.timestamp, reparsed.date.timestamp, "timestamp mismatch for: {input}");
        assert_eq!(sig.date.tz_offset, reparsed.date.tz_offset, "tz_offset mismatch for: {input}");
    }
}

fn formatted(raw: &str, fmt: DateFormat) -> String {
    GitDate::parse_raw(raw).unwrap().format(fmt)
}

/// Verify that ISO format produces valid output: YYYY-MM-DD HH:MM:SS +ZZZZ.
#[test]
fn iso_format_structure() {
    let out = formatted("1234567890 +0000", DateFormat::Iso);

    assert!(out.len() >= 25, "ISO format too short: {out}");
    assert_eq!(&out[4..5], "-", "ISO missing first dash");
    assert_eq!(&out[7..8], "-", "ISO missing second dash");
    assert_eq!(&out[10..11], " ", "ISO missing space");
    assert_eq!(&out[13..14], ":", "ISO missing first colon");
    assert_eq!(&out[16..17], ":", "ISO missing second colon");
}

/// Verify that IsoStrict format is valid ISO 8601 (contains a `T` separator).
#[test]
fn iso_strict_format_structure() {
    let out = formatted("1234567890 +0000", DateFormat::IsoStrict);
    assert!(out.contains('T'), "IsoStrict should contain T: {out}");
}

/// Verify that Short format is YYYY-MM-DD.
#[test]
fn short_format_structure() {
    let out = formatted("1234567890 +0000", DateFormat::Short);
    assert_eq!(out.len(), 10, "Short format should be 10 chars: {out}");
    assert_eq!(&out[4..5], "-");
    assert_eq!(&out[7..8], "-");
}

/// Verify that Unix format is just the timestamp.
#[test]
fn unix_format_is_timestamp() {
    assert_eq!(formatted("1234567890 +0000", DateFormat::Unix), "1234567890");
}

/// Verify that @timestamp parsing works.
#[test]
fn at_timestamp_parse() {
    let date = GitDate::parse("@1234567890").unwrap();
    assert_eq!(date.timestamp, 1234567890);
}

/// Verify various timezone offsets, expressed in minutes.
#[test]
fn timezone_offsets() {
    let cases = [
        ("+0000", 0),
        ("-0500", -300),
        ("+0530", 330),
        ("+1200", 720),
        ("-1100", -660),
        ("+0100", 60),
        ("-0800", -480),
    ];

    for (tz_str, expected_minutes) in cases {
        let date = GitDate::parse_raw(&format!("1234567890 {tz_str}")).unwrap();
        assert_eq!(date.tz_offset, expected_minutes, "tz_offset mismatch for {tz_str}");
    }
}

/// Verify parse handles edge case timestamps: epoch and the 32-bit rollover.
#[test]
fn edge_timestamps() {
    assert_eq!(GitDate::parse_raw("0 +0000").unwrap().timestamp, 0);
    assert_eq!(GitDate::parse_raw("4294967295 +0000").unwrap().timestamp, 4294967295);
}

/// Verify RFC2822 format output contains a weekday and month abbreviation.
#[test]
fn rfc2822_format() {
    let out = formatted("1234567890 +0000", DateFormat::Rfc2822);

    const WEEKDAYS: &[&str] = &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    const MONTHS: &[&str] = &[
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    assert!(WEEKDAYS.iter().any(|d| out.contains(d)), "RFC2822 should contain weekday: {out}");
    assert!(MONTHS.iter().any(|m| out.contains(m)), "RFC2822 should contain month: {out}");
}
