//! Command verbs
//!
//! The first line of every command cycle names the verb. Verbs are
//! matched exactly (case-sensitive), as existing clients send them.

use std::fmt;

/// A recognised command verb.
///
/// # Examples
///
/// ```
/// use mailspool::Command;
///
/// assert_eq!(Command::parse("LIST"), Some(Command::List));
/// assert_eq!(Command::parse("DELETE"), Some(Command::Del));
/// assert_eq!(Command::parse("list"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Submit a message.
    Send,
    /// List message ids in a mailbox.
    List,
    /// Return one message's body.
    Read,
    /// Remove one message.
    Del,
    /// End the session without a reply.
    Quit,
}

impl Command {
    /// Parse a verb line. Returns `None` for anything unrecognised.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        match line {
            "SEND" => Some(Self::Send),
            "LIST" => Some(Self::List),
            "READ" => Some(Self::Read),
            "DEL" | "DELETE" => Some(Self::Del),
            "QUIT" => Some(Self::Quit),
            _ => None,
        }
    }

    /// The wire spelling of this verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "SEND",
            Self::List => "LIST",
            Self::Read => "READ",
            Self::Del => "DEL",
            Self::Quit => "QUIT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
