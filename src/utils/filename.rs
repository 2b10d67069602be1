//! Title to path-segment conversion.

use std::sync::OnceLock;

use regex::Regex;

/// Characters collapsed into a single `-`: `? : / - ! @` and whitespace.
const SEPARATOR_RUN: &str = r"[?:\s/\-!@]+";

fn separator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SEPARATOR_RUN).expect("separator pattern is valid"))
}

/// Replace every maximal run of separator characters with a single `-`.
///
/// Only collapses noisy punctuation; it does not make arbitrary input safe
/// against every platform-reserved character. Callers trim titles first.
pub fn sanitize(title: &str) -> String {
    separator_run().replace_all(title, "-").into_owned()
}

/// Sanitize `title`, falling back to `fallback` when nothing usable is left.
pub fn segment_or(title: &str, fallback: &str) -> String {
    let segment = sanitize(title.trim());
    if segment.chars().all(|c| c == '-') {
        fallback.to_string()
    } else {
        segment
    }
}
