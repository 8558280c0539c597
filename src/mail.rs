//! Mail entity
//!
//! A [`Mail`] is built per SEND, validated up front, and handed to the
//! spool. On disk it is rendered as a small header block, a blank line
//! and the body:
//!
//! ```text
//! From: alice
//! To: bob
//! Subject: Hi
//! Date: Fri, 16 Oct 2026 09:00:00 +0000
//!
//! Hello
//! ```

use crate::error::{Error, Result};
use crate::username::Username;
use chrono::{DateTime, Utc};

/// Maximum length of the sender and receiver fields, in characters.
pub const MAX_NAME_LEN: usize = 8;

/// Maximum length of the subject field, in characters.
pub const MAX_SUBJECT_LEN: usize = 80;

/// Line that terminates a SEND body.
pub const BODY_TERMINATOR: &str = ".";

/// A validated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    sender: String,
    receiver: Username,
    subject: String,
    body: Vec<String>,
}

impl Mail {
    /// Validate the fields and build a message.
    ///
    /// Checks run in order (sender, receiver, subject, body) and stop
    /// at the first violation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidField`] for a field outside its limits and
    /// [`Error::InvalidUsername`] for a receiver that is not a safe
    /// mailbox name.
    pub fn new(
        sender: impl Into<String>,
        receiver: &str,
        subject: impl Into<String>,
        body: Vec<String>,
    ) -> Result<Self> {
        let sender = sender.into();
        check_field("sender", &sender, MAX_NAME_LEN)?;

        check_field("receiver", receiver, MAX_NAME_LEN)?;
        let receiver = Username::parse(receiver)?;

        let subject = subject.into();
        check_field("subject", &subject, MAX_SUBJECT_LEN)?;

        for line in &body {
            if line.contains('\n') {
                return Err(Error::invalid_field("body", "line contains a line break"));
            }
            if line == BODY_TERMINATOR {
                return Err(Error::invalid_field("body", "line equals the terminator"));
            }
        }

        Ok(Self {
            sender,
            receiver,
            subject,
            body,
        })
    }

    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// The recipient, which is also the mailbox the message lands in.
    #[must_use]
    pub const fn receiver(&self) -> &Username {
        &self.receiver
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// The body with every line terminated by `\n`.
    #[must_use]
    pub fn body_text(&self) -> String {
        let mut text = String::new();
        for line in &self.body {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    /// Render the on-disk representation.
    #[must_use]
    pub fn render(&self, date: DateTime<Utc>) -> String {
        format!(
            "From: {}\nTo: {}\nSubject: {}\nDate: {}\n\n{}",
            self.sender,
            self.receiver,
            self.subject,
            date.to_rfc2822(),
            self.body_text()
        )
    }

    /// Reconstruct a message from its on-disk representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if a header is missing or invalid.
    pub fn parse(content: &str) -> Result<Self> {
        let (headers, body) = content
            .split_once("\n\n")
            .ok_or_else(|| Error::Malformed("missing header separator".into()))?;

        let mut sender = None;
        let mut receiver = None;
        let mut subject = None;
        for line in headers.split('\n') {
            let Some((name, value)) = line.split_once(": ") else {
                return Err(Error::Malformed(format!("bad header line {line:?}")));
            };
            match name {
                "From" => sender = Some(value),
                "To" => receiver = Some(value),
                "Subject" => subject = Some(value),
                _ => {}
            }
        }

        let missing = |name: &str| Error::Malformed(format!("missing {name} header"));
        let sender = sender.ok_or_else(|| missing("From"))?;
        let receiver = receiver.ok_or_else(|| missing("To"))?;
        let subject = subject.ok_or_else(|| missing("Subject"))?;

        Self::new(sender, receiver, subject, split_lines(body))
            .map_err(|e| Error::Malformed(e.to_string()))
    }
}

/// Split `\n`-terminated text into lines without their terminators.
///
/// Unlike [`str::lines`], a trailing `\r` is kept as content.
pub(crate) fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.strip_suffix('\n')
        .unwrap_or(text)
        .split('\n')
        .map(str::to_string)
        .collect()
}

fn check_field(field: &'static str, value: &str, max: usize) -> Result<()> {
    if value.is_empty() {
        return Err(Error::invalid_field(field, "must not be empty"));
    }
    if value.chars().count() > max {
        return Err(Error::invalid_field(
            field,
            format!("longer than {max} characters"),
        ));
    }
    if value.contains(['\r', '\n']) {
        return Err(Error::invalid_field(field, "must be a single line"));
    }
    Ok(())
}
