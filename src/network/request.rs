use super::wire::{self, Command, Message};
use crate::prelude::*;

/// Everything a client may ask of the server, with its payload already split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Login { username: String, password: String },
    Logout,
    Logged,
    GetQuestion,
    /// `choice` is left raw; what counts as a valid choice is a game rule.
    SendAnswer { question: String, choice: String },
    MyScore,
    Highscore,
}

impl Request {
    pub fn parse(msg: &Message) -> Result<Self, RequestError> {
        let missing = || RequestError::MissingFields {
            command: msg.command,
            payload: msg.payload.clone(),
        };
        Ok(match msg.command {
            Command::Login => {
                let [username, password] = wire::fields(&msg.payload).ok_or_else(missing)?;
                Request::Login { username: username.to_owned(), password: password.to_owned() }
            }
            Command::SendAnswer => {
                let [question, choice] = wire::fields(&msg.payload).ok_or_else(missing)?;
                Request::SendAnswer { question: question.to_owned(), choice: choice.to_owned() }
            }
            // payloads of the remaining client commands are ignored
            Command::Logout => Request::Logout,
            Command::Logged => Request::Logged,
            Command::GetQuestion => Request::GetQuestion,
            Command::MyScore => Request::MyScore,
            Command::Highscore => Request::Highscore,
            other => return Err(RequestError::NotAClientCommand(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(command: Command, payload: &str) -> Message {
        Message { command, payload: payload.into() }
    }

    #[test]
    fn parses_login_fields() {
        assert_eq!(
            Request::parse(&msg(Command::Login, "alice#secret")),
            Ok(Request::Login { username: "alice".into(), password: "secret".into() })
        );
    }

    #[test]
    fn login_needs_two_fields() {
        assert!(matches!(
            Request::parse(&msg(Command::Login, "alice")),
            Err(RequestError::MissingFields { command: Command::Login, .. })
        ));
        assert!(Request::parse(&msg(Command::Login, "a#b#c")).is_err());
    }

    #[test]
    fn parses_answer_fields() {
        assert_eq!(
            Request::parse(&msg(Command::SendAnswer, "3#Two")),
            Ok(Request::SendAnswer { question: "3".into(), choice: "Two".into() })
        );
    }

    #[test]
    fn server_commands_are_not_requests() {
        for &command in Command::ALL.iter().filter(|c| !c.is_client()) {
            let parsed = Request::parse(&msg(command, ""));
            assert_eq!(parsed, Err(RequestError::NotAClientCommand(command)));
        }
    }

    #[test]
    fn bare_commands_ignore_payload() {
        assert_eq!(Request::parse(&msg(Command::Highscore, "whatever")), Ok(Request::Highscore));
        assert_eq!(Request::parse(&msg(Command::Logout, "")), Ok(Request::Logout));
    }
}
