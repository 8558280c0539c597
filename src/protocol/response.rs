//! Reply envelope
//!
//! Recognised commands answer with a status line, `OK` or `ERR`; `OK`
//! may be followed by payload lines. An unrecognised verb gets the bare
//! line `invalid command` instead, outside the envelope, which is what
//! existing clients expect.

use crate::error::{Error, Result};
use crate::mail::split_lines;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ERR: &str = "ERR";
pub const INVALID_COMMAND: &str = "invalid command";

/// One reply to one command cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `OK` followed by payload lines.
    Ok(Vec<String>),
    /// `ERR`.
    Err,
    /// `invalid command`.
    InvalidCommand,
}

impl Response {
    /// `OK` with no payload.
    #[must_use]
    pub const fn ok() -> Self {
        Self::Ok(Vec::new())
    }

    /// The reply as written on the wire, every line `\n`-terminated.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Ok(payload) => {
                let mut text = format!("{STATUS_OK}\n");
                for line in payload {
                    text.push_str(line);
                    text.push('\n');
                }
                text
            }
            Self::Err => format!("{STATUS_ERR}\n"),
            Self::InvalidCommand => format!("{INVALID_COMMAND}\n"),
        }
    }

    /// Parse a complete reply. Any payload after `ERR` is diagnostic
    /// only and discarded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] for an empty reply or an unknown status
    /// line.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = split_lines(text).into_iter();
        let status = lines
            .next()
            .ok_or_else(|| Error::Protocol("empty reply".into()))?;
        match status.strip_suffix('\r').unwrap_or(&status) {
            STATUS_OK => Ok(Self::Ok(lines.collect())),
            STATUS_ERR => Ok(Self::Err),
            INVALID_COMMAND => Ok(Self::InvalidCommand),
            other => Err(Error::Protocol(format!("unexpected status line {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_ok_with_payload() {
        let response = Response::Ok(vec!["messages: 1".into(), "1".into()]);
        assert_eq!(response.render(), "OK\nmessages: 1\n1\n");
    }

    #[test]
    fn renders_bare_statuses() {
        assert_eq!(Response::ok().render(), "OK\n");
        assert_eq!(Response::Err.render(), "ERR\n");
        assert_eq!(Response::InvalidCommand.render(), "invalid command\n");
    }

    #[test]
    fn parses_what_it_renders() {
        for response in [
            Response::ok(),
            Response::Err,
            Response::InvalidCommand,
            Response::Ok(vec!["Hello".into(), String::new(), "Bye".into()]),
        ] {
            assert_eq!(Response::parse(&response.render()).unwrap(), response);
        }
    }

    #[test]
    fn err_payload_is_ignored() {
        assert_eq!(Response::parse("ERR\nno such user\n").unwrap(), Response::Err);
    }

    #[test]
    fn rejects_unknown_status() {
        assert!(matches!(Response::parse("MAYBE\n"), Err(Error::Protocol(_))));
        assert!(matches!(Response::parse(""), Err(Error::Protocol(_))));
    }
}
