//! Removal of `<think>` reasoning blocks from model output.
//!
//! Some models emit their internal deliberation between `<think>` and
//! `</think>` before the actual answer. That text must never reach users.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("Invalid think-block regex"));

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid newline regex"));

/// Strip every `<think>…</think>` span, including its contents.
///
/// Each span runs non-greedily from an opening marker to the first closing
/// marker after it and may cover several lines. When the text contains any
/// marker, runs of three or more newlines collapse to a blank line; text
/// without markers is only trimmed. The result is always trimmed, and
/// `strip_reasoning(strip_reasoning(x))` equals `strip_reasoning(x)`. An
/// unclosed `<think>` stays in the output.
pub fn strip_reasoning(text: &str) -> String {
    if !text.contains("<think>") && !text.contains("</think>") {
        return text.trim().to_string();
    }

    // Removing an inner span can splice together a new complete span
    // (e.g. `<thi<think>x</think>nk>…</think>`), so repeat to a fixpoint.
    let mut current = text.to_string();
    loop {
        let next = match THINK_BLOCK.replace_all(&current, "") {
            Cow::Borrowed(_) => break,
            Cow::Owned(s) => s,
        };
        current = next;
    }

    EXCESS_NEWLINES
        .replace_all(&current, "\n\n")
        .trim()
        .to_string()
}
