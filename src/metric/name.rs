//! Character rules for metric names, tag keys and tag values

use std::borrow::Cow;

#[inline]
fn is_allowed(ch: char, convert_paths: bool) -> bool {
    ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || (ch == '_' && !convert_paths)
}

/// Replace characters the backend rejects in names and tag keys
///
/// Letters, digits, `.` and `-` pass through. With `convert_paths` every `_`
/// becomes `.`; without it `_` is kept. Anything else becomes one `-`, so the
/// result has the same number of characters as the input.
///
/// # Examples
/// ```
/// use prom_storage_adapter::metric::sanitize_name;
///
/// assert_eq!(sanitize_name("node_cpu seconds", true), "node.cpu-seconds");
/// assert_eq!(sanitize_name("node_cpu seconds", false), "node_cpu-seconds");
/// ```
#[must_use]
pub fn sanitize_name(name: &str, convert_paths: bool) -> Cow<'_, str> {
    let Some(first_bad) = name.find(|ch: char| !is_allowed(ch, convert_paths)) else {
        return Cow::Borrowed(name);
    };

    let mut out = String::with_capacity(name.len());
    out.push_str(&name[..first_bad]);
    for ch in name[first_bad..].chars() {
        if is_allowed(ch, convert_paths) {
            out.push(ch);
        } else if ch == '_' {
            out.push('.');
        } else {
            out.push('-');
        }
    }
    Cow::Owned(out)
}

/// Escape a tag value (or source) for the line protocol
///
/// `"` becomes `\"` and `*` becomes `-`; nothing else is touched.
#[must_use]
pub fn escape_tag_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '*']) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '*' => out.push('-'),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
