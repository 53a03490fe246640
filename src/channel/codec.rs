//! Control-channel byte protocol decoder.
//!
//! Wire format, single-output boards:
//! ```text
//! ┌──────────────┬──────────────┐
//! │ value (1B)   │ optional \n  │
//! │ '0' or '1'   │              │
//! └──────────────┴──────────────┘
//! ```
//!
//! Addressed boards prepend a line id:
//! ```text
//! ┌──────────────┬──────────────┬──────────────┐
//! │ line id (1B) │ value (1B)   │ optional \n  │
//! │ ASCII digit  │ '0' or '1'   │              │
//! └──────────────┴──────────────┴──────────────┘
//! ```
//!
//! Decoding is total: every possible byte sequence yields either
//! `Some(Command)` or `None`, never a fault. Length is validated before
//! any indexing; the trailing newline (shell writers) is stripped, not
//! treated as data. Whether a decoded line id is actually configured is
//! the controller's concern, not the codec's.

use serde::{Deserialize, Serialize};

use crate::app::commands::{Command, LineId};

/// Longest accepted write: id byte + value byte + newline.
pub const MAX_WRITE_LEN: usize = 3;

/// Which wire format the channel speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    /// One implicit line; a single value byte.
    Single,
    /// Line id byte followed by a value byte.
    Addressed,
}

/// Decode one write into a command. `None` means malformed.
pub fn decode(proto: Protocol, bytes: &[u8]) -> Option<Command> {
    if bytes.is_empty() || bytes.len() > MAX_WRITE_LEN {
        return None;
    }
    let body = strip_newline(bytes);

    match (proto, body) {
        (Protocol::Single, [value]) => Some(Command::Set {
            line: LineId::SINGLE,
            value: parse_value(*value)?,
        }),
        (Protocol::Addressed, [id, value]) => Some(Command::Set {
            line: LineId(parse_line_id(*id)?),
            value: parse_value(*value)?,
        }),
        _ => None,
    }
}

fn strip_newline(bytes: &[u8]) -> &[u8] {
    match bytes {
        [body @ .., b'\n'] => body,
        _ => bytes,
    }
}

fn parse_value(byte: u8) -> Option<bool> {
    match byte {
        b'0' => Some(false),
        b'1' => Some(true),
        _ => None,
    }
}

fn parse_line_id(byte: u8) -> Option<u8> {
    byte.is_ascii_digit().then(|| byte - b'0')
}
