//! Anchor codec - attach, detect and remove line-end anchors
//!
//! An anchor is a block reference appended to the first line of a topic:
//! `Some text ^topic-k3x9q2mz`
//!
//! Only a trailing, namespaced marker counts as an anchor. A marker in the
//! middle of a line, or a block reference without the `topic-` prefix, is
//! ordinary text.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::collections::HashSet;

/// Prefix shared by every anchor token
pub const ANCHOR_PREFIX: &str = "topic-";

/// Number of random characters after the prefix
pub const ANCHOR_SUFFIX_LEN: usize = 8;

const ANCHOR_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Trailing anchor: one delimiter, a caret, the namespaced token, optional trailing blanks.
/// Six-character suffixes are accepted for data written by older versions.
static ANCHOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[ \t])\^(topic-[a-z0-9]{6,})[ \t]*$").expect("Invalid ANCHOR_RE regex")
});

/// Generate a fresh anchor token.
///
/// Uniqueness is probabilistic (36^8 possible suffixes); use
/// [`generate_unique_anchor`] when the live tokens are known.
pub fn generate_anchor() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ANCHOR_SUFFIX_LEN)
        .map(|_| ANCHOR_CHARSET[rng.gen_range(0..ANCHOR_CHARSET.len())] as char)
        .collect();
    format!("{}{}", ANCHOR_PREFIX, suffix)
}

/// Generate a token that does not collide with any of `existing`
pub fn generate_unique_anchor(existing: &HashSet<&str>) -> String {
    loop {
        let token = generate_anchor();
        if !existing.contains(token.as_str()) {
            return token;
        }
        log::debug!("anchor collision on {}, drawing again", token);
    }
}

/// Whether a string is a well-formed anchor token
pub fn is_anchor_token(token: &str) -> bool {
    token
        .strip_prefix(ANCHOR_PREFIX)
        .map(|suffix| {
            suffix.len() >= 6
                && suffix
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
        .unwrap_or(false)
}

/// Return the anchor at the end of `line`, if any
pub fn detect(line: &str) -> Option<&str> {
    ANCHOR_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Remove a trailing anchor; identity when the line has none
pub fn detach(line: &str) -> String {
    match ANCHOR_RE.find(line) {
        Some(m) => line[..m.start()].trim_end().to_string(),
        None => line.to_string(),
    }
}

/// Append `token` to `line`, replacing an existing anchor
pub fn attach(line: &str, token: &str) -> String {
    let visible = detach(line);
    format!("{} ^{}", visible.trim_end(), token)
}

/// Index of the first line anchored with `token`
pub fn locate<S: AsRef<str>>(lines: &[S], token: &str) -> Option<usize> {
    lines
        .iter()
        .position(|line| detect(line.as_ref()) == Some(token))
}
