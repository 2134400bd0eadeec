// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Regex-based secret redaction for stored text and log output.

use std::io::Write;
use std::sync::LazyLock;

use regex::Regex;

/// The redaction placeholder.
pub const REDACTED: &str = "[REDACTED]";

/// Patterns whose whole match is a secret.
static TOKEN_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Anthropic API keys: sk-ant-api03-...
        Regex::new(r"sk-ant-[a-zA-Z0-9_\-]{20,}").unwrap(),
        // OpenAI-style keys
        Regex::new(r"sk-[a-zA-Z0-9]{20,}").unwrap(),
        // Bearer tokens
        Regex::new(r"Bearer\s+[a-zA-Z0-9._\-]{10,}").unwrap(),
        // AWS access key ids
        Regex::new(r"\bAKIA[0-9A-Z]{16}\b").unwrap(),
        // GitHub tokens
        Regex::new(r"\bgh[pousr]_[A-Za-z0-9]{30,}\b").unwrap(),
    ]
});

/// `name = value` style assignments where only the value is secret.
static ASSIGNMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(api[_\-]?key|access[_\-]?token|auth[_\-]?token|token|password|passwd|secret)(\s*[:=]\s*|\s+is\s+)["']?[^\s"',;]{4,}["']?"#,
    )
    .unwrap()
});

/// Replace every secret-like substring in `input` with [`REDACTED`].
///
/// Assignment-style matches keep their key so the surrounding text stays
/// readable: `password=hunter22` becomes `password=[REDACTED]`.
pub fn redact(input: &str) -> String {
    let mut result = input.to_string();
    for pattern in TOKEN_PATTERNS.iter() {
        if pattern.is_match(&result) {
            result = pattern.replace_all(&result, REDACTED).into_owned();
        }
    }
    if ASSIGNMENT_PATTERN.is_match(&result) {
        result = ASSIGNMENT_PATTERN
            .replace_all(&result, |caps: &regex::Captures<'_>| {
                format!("{}{}{REDACTED}", &caps[1], &caps[2])
            })
            .into_owned();
    }
    result
}

/// Whether `input` contains anything [`redact`] would replace.
pub fn contains_secret(input: &str) -> bool {
    TOKEN_PATTERNS.iter().any(|p| p.is_match(input)) || ASSIGNMENT_PATTERN.is_match(input)
}

/// A writer wrapper that redacts secrets before forwarding bytes.
///
/// Used as the log sink so request errors that echo headers or keys never
/// reach the terminal verbatim.
pub struct RedactingWriter<W> {
    inner: W,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl RedactingWriter<std::io::Stderr> {
    /// A redacting writer over the process's stderr.
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        self.inner.write_all(redact(&input).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
