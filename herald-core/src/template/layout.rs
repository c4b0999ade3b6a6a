//! Date layouts
//!
//! CI templates describe dates with Go reference layouts
//! (`2006-01-02 15:04:05`). They are translated into strftime patterns for
//! chrono. A pattern that already contains `%` is taken as strftime as is.

/// Go layout tokens, longest first within each leading character
const TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("002", "%j"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
    ("_2", "%e"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
];

/// Offset tokens that Go prints as a literal `Z` when the offset is zero
const ZULU_TOKENS: &[(&str, &str)] = &[("Z07:00", "%:z"), ("Z0700", "%z")];

/// Converts a date layout into a strftime pattern
pub fn to_strftime(layout: &str) -> String {
    translate(layout, false)
}

/// Converts a date layout for a date whose UTC offset is zero
///
/// Identical to [`to_strftime`] except that `Z07:00` and `Z0700` become `Z`.
pub fn to_strftime_utc(layout: &str) -> String {
    translate(layout, true)
}

fn translate(layout: &str, zulu: bool) -> String {
    if layout.contains('%') {
        return layout.to_string();
    }

    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;

    'outer: while let Some(c) = rest.chars().next() {
        if let Some((pattern, consumed)) = fractional_seconds(rest) {
            out.push_str(pattern);
            rest = &rest[consumed..];
            continue;
        }

        for (token, pattern) in ZULU_TOKENS {
            if rest.starts_with(token) {
                out.push_str(if zulu { "Z" } else { pattern });
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }

        for (token, pattern) in TOKENS {
            if rest.starts_with(token) {
                out.push_str(pattern);
                rest = &rest[token.len()..];
                continue 'outer;
            }
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    out
}

/// Matches `.000`, `.999999` and friends
fn fractional_seconds(rest: &str) -> Option<(&'static str, usize)> {
    let bytes = rest.as_bytes();
    if bytes.len() < 2 || (bytes[0] != b'.' && bytes[0] != b',') {
        return None;
    }
    let digit = bytes[1];
    if digit != b'0' && digit != b'9' {
        return None;
    }
    let run = bytes[1..].iter().take_while(|&&b| b == digit).count();
    if bytes.get(1 + run).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    let pattern = match run {
        1..=3 => "%.3f",
        4..=6 => "%.6f",
        _ => "%.9f",
    };
    Some((pattern, 1 + run))
}
