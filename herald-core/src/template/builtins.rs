//! Built-in template helpers

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;
use std::fmt::Write;

use super::context::{RenderContext, display_value, is_truthy};
use super::helpers::{BlockHelper, Helper, HelperRegistry, expect_arity, int_arg, str_arg};
use super::layout::{to_strftime, to_strftime_utc};
use crate::domain::build::STATUS_SUCCESS;
use crate::error::RenderError;

/// Registers every built-in helper
pub fn register_builtins(registry: &mut HelperRegistry) {
    registry.register_block(SuccessHelper);
    registry.register_block(FailureHelper);
    registry.register_block(IfHelper);
    registry.register_block(UnlessHelper);
    registry.register(DatetimeHelper);
    registry.register(DurationHelper);
    registry.register(SinceHelper);
    registry.register(UppercaseHelper);
    registry.register(LowercaseHelper);
    registry.register(UppercaseFirstHelper);
    registry.register(TruncateHelper);
    registry.register(UrlEncodeHelper);
    registry.register(RegexReplaceHelper);
}

// =============================================================================
// Block helpers
// =============================================================================

/// `{{#success Build.Status}}` renders its body only for successful builds
pub struct SuccessHelper;

impl BlockHelper for SuccessHelper {
    fn name(&self) -> &'static str {
        "success"
    }

    fn test(&self, args: &[Value], _ctx: &RenderContext) -> Result<bool, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        Ok(display_value(&args[0]) == STATUS_SUCCESS)
    }
}

/// `{{#failure Build.Status}}` renders its body for any non-success status
pub struct FailureHelper;

impl BlockHelper for FailureHelper {
    fn name(&self) -> &'static str {
        "failure"
    }

    fn test(&self, args: &[Value], _ctx: &RenderContext) -> Result<bool, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        Ok(display_value(&args[0]) != STATUS_SUCCESS)
    }
}

pub struct IfHelper;

impl BlockHelper for IfHelper {
    fn name(&self) -> &'static str {
        "if"
    }

    fn test(&self, args: &[Value], _ctx: &RenderContext) -> Result<bool, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        Ok(is_truthy(&args[0]))
    }
}

pub struct UnlessHelper;

impl BlockHelper for UnlessHelper {
    fn name(&self) -> &'static str {
        "unless"
    }

    fn test(&self, args: &[Value], _ctx: &RenderContext) -> Result<bool, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        Ok(!is_truthy(&args[0]))
    }
}

// =============================================================================
// Dates and durations
// =============================================================================

/// `{{ datetime <epoch seconds> <layout> [zone] }}`
///
/// An empty or missing zone formats in UTC. `Local` uses the process time
/// zone; anything else must be an IANA name (`Asia/Shanghai`) or a fixed
/// offset (`+08:00`).
pub struct DatetimeHelper;

impl Helper for DatetimeHelper {
    fn name(&self) -> &'static str {
        "datetime"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 2, 3)?;
        let timestamp = int_arg(self.name(), &args[0])?;
        let layout = str_arg(self.name(), &args[1])?;
        let zone = match args.get(2) {
            Some(value) => str_arg(self.name(), value)?.trim(),
            None => "",
        };
        format_timestamp(timestamp, layout, zone)
    }
}

/// Formats epoch seconds with a Go layout or strftime pattern in the given zone
pub fn format_timestamp(timestamp: i64, layout: &str, zone: &str) -> Result<String, RenderError> {
    let utc = DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        RenderError::helper("datetime", format!("timestamp {} is out of range", timestamp))
    })?;

    match zone {
        "" | "UTC" | "utc" => write_date(&utc, layout),
        "Local" | "local" => write_date(&utc.with_timezone(&Local), layout),
        _ if zone.starts_with('+') || zone.starts_with('-') => {
            let offset: FixedOffset = zone.parse().map_err(|_| {
                RenderError::helper("datetime", format!("invalid utc offset '{}'", zone))
            })?;
            write_date(&utc.with_timezone(&offset), layout)
        }
        _ => {
            let tz: chrono_tz::Tz = zone.parse().map_err(|_| {
                RenderError::helper("datetime", format!("unknown time zone '{}'", zone))
            })?;
            write_date(&utc.with_timezone(&tz), layout)
        }
    }
}

fn write_date<Tz>(date: &DateTime<Tz>, layout: &str) -> Result<String, RenderError>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let pattern = if date.offset().fix().local_minus_utc() == 0 {
        to_strftime_utc(layout)
    } else {
        to_strftime(layout)
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(RenderError::helper(
            "datetime",
            format!("invalid date layout '{}'", layout),
        ));
    }

    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.iter()))
        .map_err(|_| RenderError::helper("datetime", "failed to format date"))?;
    Ok(out)
}

/// `{{ duration <start> <end> }}` renders the elapsed time as `1h2m3s`
pub struct DurationHelper;

impl Helper for DurationHelper {
    fn name(&self) -> &'static str {
        "duration"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 2, 2)?;
        let started = int_arg(self.name(), &args[0])?;
        let finished = int_arg(self.name(), &args[1])?;
        Ok(format_duration(finished.saturating_sub(started)))
    }
}

/// `{{ since Build.Started }}` renders the time elapsed until now
pub struct SinceHelper;

impl Helper for SinceHelper {
    fn name(&self) -> &'static str {
        "since"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        let started = int_arg(self.name(), &args[0])?;
        Ok(format_duration(Utc::now().timestamp().saturating_sub(started)))
    }
}

/// Formats whole seconds the way Go prints a `time.Duration`
pub fn format_duration(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{}{}h{}m{}s", sign, hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}{}m{}s", sign, minutes, secs)
    } else {
        format!("{}{}s", sign, secs)
    }
}

// =============================================================================
// String helpers
// =============================================================================

pub struct UppercaseHelper;

impl Helper for UppercaseHelper {
    fn name(&self) -> &'static str {
        "uppercase"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        Ok(display_value(&args[0]).to_uppercase())
    }
}

pub struct LowercaseHelper;

impl Helper for LowercaseHelper {
    fn name(&self) -> &'static str {
        "lowercase"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        Ok(display_value(&args[0]).to_lowercase())
    }
}

pub struct UppercaseFirstHelper;

impl Helper for UppercaseFirstHelper {
    fn name(&self) -> &'static str {
        "uppercasefirst"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        let text = display_value(&args[0]);
        let mut chars = text.chars();
        Ok(match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        })
    }
}

/// `{{ truncate Commit.Sha 8 }}` keeps the first n characters
pub struct TruncateHelper;

impl Helper for TruncateHelper {
    fn name(&self) -> &'static str {
        "truncate"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 2, 2)?;
        let length = int_arg(self.name(), &args[1])?;
        let length = usize::try_from(length).map_err(|_| {
            RenderError::helper(self.name(), format!("length {} is negative", length))
        })?;
        Ok(display_value(&args[0]).chars().take(length).collect())
    }
}

/// `{{ urlencode Commit.Branch }}` escapes a value for a URL query
pub struct UrlEncodeHelper;

impl Helper for UrlEncodeHelper {
    fn name(&self) -> &'static str {
        "urlencode"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 1, 1)?;
        Ok(query_escape(&display_value(&args[0])))
    }
}

fn query_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => {
                let _ = write!(out, "%{:02X}", byte);
            }
        }
    }
    out
}

/// `{{ regexReplace <pattern> <input> <replacement> }}`
///
/// Replaces every match; the replacement may refer to groups as `$1`.
pub struct RegexReplaceHelper;

impl Helper for RegexReplaceHelper {
    fn name(&self) -> &'static str {
        "regexReplace"
    }

    fn call(&self, args: &[Value], _ctx: &RenderContext) -> Result<String, RenderError> {
        expect_arity(self.name(), args, 3, 3)?;
        let pattern = str_arg(self.name(), &args[0])?;
        let input = display_value(&args[1]);
        let replacement = str_arg(self.name(), &args[2])?;

        let regex = Regex::new(pattern).map_err(|e| {
            RenderError::helper(self.name(), format!("invalid pattern '{}': {}", pattern, e))
        })?;
        Ok(regex.replace_all(&input, replacement).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> RenderContext {
        RenderContext::from_value(json!({}))
    }

    #[test]
    fn test_success_and_failure_are_complementary() {
        for status in ["success", "failure", "killed", "error", "running"] {
            let args = [json!(status)];
            let success = SuccessHelper.test(&args, &ctx()).unwrap();
            let failure = FailureHelper.test(&args, &ctx()).unwrap();
            assert_ne!(success, failure, "status {}", status);
            assert_eq!(success, status == "success");
        }
    }

    #[test]
    fn test_block_helpers_require_one_argument() {
        assert!(SuccessHelper.test(&[], &ctx()).is_err());
        assert!(FailureHelper.test(&[json!("a"), json!("b")], &ctx()).is_err());
    }

    #[test]
    fn test_if_and_unless() {
        assert!(IfHelper.test(&[json!("v1.2.0")], &ctx()).unwrap());
        assert!(!IfHelper.test(&[json!("")], &ctx()).unwrap());
        assert!(UnlessHelper.test(&[json!(0)], &ctx()).unwrap());
    }

    #[test]
    fn test_datetime_epoch_zero_utc() {
        let out = DatetimeHelper
            .call(&[json!(0), json!("2006-01-02 15:04:05"), json!("")], &ctx())
            .unwrap();
        assert_eq!(out, "1970-01-01 00:00:00");

        let again = format_timestamp(0, "2006-01-02 15:04:05", "").unwrap();
        assert_eq!(out, again);
    }

    #[test]
    fn test_datetime_zone_is_optional() {
        let out = DatetimeHelper
            .call(&[json!(1_700_000_000), json!("%Y-%m-%d %H:%M")], &ctx())
            .unwrap();
        assert_eq!(out, "2023-11-14 22:13");
    }

    #[test]
    fn test_datetime_named_and_fixed_zones() {
        assert_eq!(
            format_timestamp(0, "2006-01-02 15:04", "Asia/Shanghai").unwrap(),
            "1970-01-01 08:00"
        );
        assert_eq!(
            format_timestamp(0, "15:04 -07:00", "-05:00").unwrap(),
            "19:00 -05:00"
        );
    }

    #[test]
    fn test_datetime_rfc3339_layout() {
        let layout = "2006-01-02T15:04:05Z07:00";
        assert_eq!(format_timestamp(0, layout, "").unwrap(), "1970-01-01T00:00:00Z");
        assert_eq!(
            format_timestamp(0, layout, "+08:00").unwrap(),
            "1970-01-01T08:00:00+08:00"
        );
        assert_eq!(
            format_timestamp(0, "15:04Z0700", "Asia/Shanghai").unwrap(),
            "08:00+0800"
        );
    }

    #[test]
    fn test_datetime_accepts_numeric_strings() {
        let out = DatetimeHelper
            .call(&[json!("86400"), json!("2006-01-02"), json!("UTC")], &ctx())
            .unwrap();
        assert_eq!(out, "1970-01-02");
    }

    #[test]
    fn test_datetime_errors() {
        assert!(format_timestamp(0, "2006", "Mars/Olympus").is_err());
        assert!(format_timestamp(0, "%Q", "").is_err());
        assert!(DatetimeHelper.call(&[json!(0)], &ctx()).is_err());
        assert!(DatetimeHelper.call(&[json!("soon"), json!("2006")], &ctx()).is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(90), "1m30s");
        assert_eq!(format_duration(3605), "1h0m5s");
        assert_eq!(format_duration(-60), "-1m0s");
    }

    #[test]
    fn test_duration_helper() {
        let out = DurationHelper.call(&[json!(100), json!(220)], &ctx()).unwrap();
        assert_eq!(out, "2m0s");
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(UppercaseHelper.call(&[json!("main")], &ctx()).unwrap(), "MAIN");
        assert_eq!(LowercaseHelper.call(&[json!("MAIN")], &ctx()).unwrap(), "main");
        assert_eq!(
            UppercaseFirstHelper.call(&[json!("failure")], &ctx()).unwrap(),
            "Failure"
        );
        assert_eq!(UppercaseFirstHelper.call(&[json!("")], &ctx()).unwrap(), "");
        assert_eq!(
            TruncateHelper
                .call(&[json!("0123456789abcdef"), json!(8)], &ctx())
                .unwrap(),
            "01234567"
        );
        assert!(TruncateHelper.call(&[json!("abc"), json!(-1)], &ctx()).is_err());
    }

    #[test]
    fn test_since_counts_up_to_now() {
        let hour_ago = Utc::now().timestamp() - 3600;
        let out = SinceHelper.call(&[json!(hour_ago)], &ctx()).unwrap();
        assert!(out.starts_with("1h0m"), "got {}", out);
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(
            UrlEncodeHelper.call(&[json!("feature/a b&c")], &ctx()).unwrap(),
            "feature%2Fa+b%26c"
        );
        assert_eq!(UrlEncodeHelper.call(&[json!("v1.0_rc-1~x")], &ctx()).unwrap(), "v1.0_rc-1~x");
    }

    #[test]
    fn test_regex_replace() {
        let out = RegexReplaceHelper
            .call(&[json!("^refs/heads/(.*)$"), json!("refs/heads/main"), json!("branch $1")], &ctx())
            .unwrap();
        assert_eq!(out, "branch main");
        assert!(RegexReplaceHelper
            .call(&[json!("("), json!("x"), json!("")], &ctx())
            .is_err());
    }
}
