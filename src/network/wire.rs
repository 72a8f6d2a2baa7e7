//! Framing for the quiz protocol.
//!
//! A frame is `CMD|LEN|PAYLOAD`: the command padded with spaces to 16 bytes, the
//! payload length right-justified in 4 bytes, then the payload itself. There is no
//! trailing delimiter, and no length prefix outside the frame, so one read is
//! expected to carry exactly one frame.
use crate::prelude::*;

pub const CMD_FIELD_LENGTH: usize = 16;
pub const LENGTH_FIELD_LENGTH: usize = 4;
pub const MAX_DATA_LENGTH: usize = 9999;
pub const DELIMITER: u8 = b'|';
pub const MSG_HEADER_LENGTH: usize = CMD_FIELD_LENGTH + 1 + LENGTH_FIELD_LENGTH + 1;
pub const MAX_MSG_LENGTH: usize = MSG_HEADER_LENGTH + MAX_DATA_LENGTH;
/// Separates sub-fields inside a payload, e.g. `username#password`.
pub const FIELD_SEPARATOR: char = '#';

macro_rules! commands {
    {client { $($c:ident $ctok:literal,)* } server { $($s:ident $stok:literal,)* }} => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Command {
            $($c,)*
            $($s,)*
        }
        impl Command {
            pub const ALL: &'static [Command] = &[$(Command::$c,)* $(Command::$s,)*];

            pub fn token(self) -> &'static str {
                match self {
                    $(Command::$c => $ctok,)*
                    $(Command::$s => $stok,)*
                }
            }
            pub fn from_token(token: &str) -> Option<Self> {
                match token {
                    $($ctok => Some(Command::$c),)*
                    $($stok => Some(Command::$s),)*
                    _ => None,
                }
            }
            pub fn is_client(self) -> bool {
                match self {
                    $(Command::$c => true,)*
                    _ => false,
                }
            }
        }
    };
}
commands! {
    client {
        Login "LOGIN",
        Logout "LOGOUT",
        Logged "LOGGED",
        GetQuestion "GET_QUESTION",
        SendAnswer "SEND_ANSWER",
        MyScore "MY_SCORE",
        Highscore "HIGHSCORE",
    }
    server {
        LoginOk "LOGIN_OK",
        Error "ERROR",
        LoggedAnswer "LOGGED_ANSWER",
        YourQuestion "YOUR_QUESTION",
        CorrectAnswer "CORRECT_ANSWER",
        WrongAnswer "WRONG_ANSWER",
        YourScore "YOUR_SCORE",
        AllScore "ALL_SCORE",
        NoQuestions "NO_QUESTIONS",
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub command: Command,
    pub payload: String,
}

/// Builds a frame from a raw command token and payload.
pub fn encode(command: &str, payload: &str) -> Result<Vec<u8>, FramingError> {
    if command.len() > CMD_FIELD_LENGTH {
        return Err(FramingError::CommandTooLong);
    }
    if command.as_bytes().contains(&DELIMITER) {
        return Err(FramingError::InvalidCommand);
    }
    if payload.len() > MAX_DATA_LENGTH {
        return Err(FramingError::PayloadTooLong);
    }
    let mut frame = Vec::with_capacity(MSG_HEADER_LENGTH + payload.len());
    frame.extend_from_slice(command.as_bytes());
    frame.resize(CMD_FIELD_LENGTH, b' ');
    frame.push(DELIMITER);
    let length = format!("{:>width$}", payload.len(), width = LENGTH_FIELD_LENGTH);
    frame.extend_from_slice(length.as_bytes());
    frame.push(DELIMITER);
    frame.extend_from_slice(payload.as_bytes());
    Ok(frame)
}

/// Decodes exactly one frame. Anything left over, or missing, is `Malformed`.
pub fn decode(buf: &[u8]) -> Result<Message, FramingError> {
    if buf.is_empty() || !buf.contains(&DELIMITER) {
        return Err(FramingError::Malformed);
    }
    let text = std::str::from_utf8(buf).map_err(|_| FramingError::Malformed)?;
    let mut fields = text.split(DELIMITER as char);
    let (Some(command), Some(length), Some(payload), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(FramingError::Malformed);
    };

    let token: String = command.chars().filter(|c| c.is_alphabetic() || *c == '_').collect();
    let command = Command::from_token(&token).ok_or(FramingError::Malformed)?;
    let length: usize = length.trim().parse().map_err(|_| FramingError::Malformed)?;
    if length != payload.len() {
        return Err(FramingError::Malformed);
    }
    Ok(Message { command, payload: payload.to_owned() })
}

/// Splits a payload on [`FIELD_SEPARATOR`] into exactly `N` fields.
pub fn fields<const N: usize>(payload: &str) -> Option<[&str; N]> {
    let mut parts = payload.split(FIELD_SEPARATOR);
    let mut out = [""; N];
    for slot in out.iter_mut() {
        *slot = parts.next()?;
    }
    parts.next().is_none().then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_fixed_width_header() {
        let frame = encode("LOGIN", "alice#secret").unwrap();
        assert_eq!(frame, b"LOGIN           |  12|alice#secret");
        assert_eq!(frame.len(), MSG_HEADER_LENGTH + 12);
    }

    #[test]
    fn encodes_empty_payload() {
        assert_eq!(encode("LOGIN_OK", "").unwrap(), b"LOGIN_OK        |   0|");
    }

    #[test]
    fn rejects_oversized_fields() {
        assert_eq!(encode("A_VERY_LONG_COMMAND", ""), Err(FramingError::CommandTooLong));
        assert_eq!(encode("ERROR", &"x".repeat(10_000)), Err(FramingError::PayloadTooLong));
        assert_eq!(encode("BAD|CMD", ""), Err(FramingError::InvalidCommand));
        assert!(encode("ALL_SCORE", &"x".repeat(MAX_DATA_LENGTH)).is_ok());
    }

    #[test]
    fn round_trips_every_command() {
        for &command in Command::ALL {
            let frame = encode(command.token(), "12#three").unwrap();
            let message = decode(&frame).unwrap();
            assert_eq!(message.command, command);
            assert_eq!(message.payload, "12#three");
        }
    }

    #[test]
    fn accepts_zero_padded_length() {
        let message = decode(b"MY_SCORE        |0003|abc").unwrap();
        assert_eq!(message.command, Command::MyScore);
        assert_eq!(message.payload, "abc");
    }

    #[test]
    fn rejects_length_mismatch() {
        assert_eq!(decode(b"MY_SCORE        |   4|abc"), Err(FramingError::Malformed));
        assert_eq!(decode(b"MY_SCORE        |   2|abc"), Err(FramingError::Malformed));
        assert_eq!(decode(b"MY_SCORE        |  -3|abc"), Err(FramingError::Malformed));
        assert_eq!(decode(b"MY_SCORE        |  x3|abc"), Err(FramingError::Malformed));
    }

    #[test]
    fn rejects_structural_garbage() {
        assert_eq!(decode(b""), Err(FramingError::Malformed));
        assert_eq!(decode(b"no delimiter here"), Err(FramingError::Malformed));
        assert_eq!(decode(b"LOGIN           |   3"), Err(FramingError::Malformed));
        assert_eq!(decode(b"NOT_A_COMMAND   |   0|"), Err(FramingError::Malformed));
        // a delimiter in the payload produces a fourth field
        assert_eq!(decode(b"LOGIN           |   3|a|b"), Err(FramingError::Malformed));
    }

    #[test]
    fn command_field_is_cleaned() {
        let message = decode(b"  GET_QUESTION1  |   0|").unwrap();
        assert_eq!(message.command, Command::GetQuestion);
    }

    #[test]
    fn splits_payload_fields() {
        assert_eq!(fields::<2>("alice#secret"), Some(["alice", "secret"]));
        assert_eq!(fields::<2>("alice"), None);
        assert_eq!(fields::<2>("a#b#c"), None);
        assert_eq!(fields::<2>("#"), Some(["", ""]));
    }
}
