/// Line-break normalization for copied text.
///
/// A *break run* is a stretch of newlines joined only by horizontal whitespace
/// (`[\t\f\r ]`), together with the horizontal whitespace on both sides of it.
/// Runs containing exactly one newline are incidental wrapping and collapse
/// into the substitute. Runs with two or more newlines are paragraph breaks and
/// are left byte-for-byte intact.
use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::error;

/// Leading `[\t\f\r ]*`, one or more newlines (each optionally preceded by
/// horizontal whitespace), then trailing `[\t\f ]*`.
const BREAK_RUN_PATTERN: &str = r"[\t\f\r ]*\n(?:[\t\f\r ]*\n)*[\t\f ]*";

fn break_run() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(BREAK_RUN_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                error!(error = %e, "line break pattern failed to compile");
                None
            }
        })
        .as_ref()
}

/// Replaces every single line break in `text`, including its surrounding
/// horizontal whitespace, with `substitute`. Blank-line separated paragraphs
/// are preserved.
///
/// Returns the input borrowed when there is nothing to replace.
pub fn normalize<'a>(text: &'a str, substitute: &str) -> Cow<'a, str> {
    let Some(re) = break_run() else {
        return Cow::Borrowed(text);
    };
    if !re.is_match(text) {
        return Cow::Borrowed(text);
    }
    re.replace_all(text, |caps: &Captures<'_>| {
        let run = &caps[0];
        if newline_count(run) == 1 {
            substitute.to_owned()
        } else {
            run.to_owned()
        }
    })
}

fn newline_count(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}
