// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret handling for the Recall memory engine.
//!
//! Model output and user statements can carry credentials. Everything that
//! is persisted from the normalization path, and everything the binary
//! writes to its log stream, passes through [`redact`] first.

pub mod redact;

pub use redact::{REDACTED, RedactingWriter, contains_secret, redact};
