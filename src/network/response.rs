use crate::prelude::*;
use crate::game::Question;

macro_rules! response {
    {$($name:ident($($field:ident : $t:ty),*): $cmd:ident $e:expr;)*} => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Response {
            $($name($($t),*),)*
        }
        impl Response {
            pub fn command(&self) -> Command {
                match self {
                    $(Response::$name(..) => Command::$cmd,)*
                }
            }
            pub fn payload(&self) -> String {
                match self {
                    $(Response::$name($($field),*) => $e,)*
                }
            }
        }
    };
}
response! {
    LoginOk(): LoginOk String::new();
    Error(err: GameError): Error err.to_string();
    LoggedAnswer(names: Vec<String>): LoggedAnswer names.join(", ");
    YourQuestion(question: Question): YourQuestion {
        let mut payload = question.id.to_string();
        for part in std::iter::once(&question.text).chain(&question.options) {
            payload.push(crate::network::wire::FIELD_SEPARATOR);
            payload.push_str(part);
        }
        payload
    };
    CorrectAnswer(): CorrectAnswer String::new();
    WrongAnswer(correct: u8): WrongAnswer correct.to_string();
    YourScore(score: u32): YourScore score.to_string();
    AllScore(table: Vec<(String, u32)>): AllScore table
        .iter()
        .map(|(name, score)| format!("{name}: {score}\n"))
        .collect();
    NoQuestions(): NoQuestions String::new();
}

impl Response {
    /// Frames the response for the wire.
    pub fn encode(&self) -> Result<Vec<u8>, FramingError> {
        super::wire::encode(self.command().token(), &self.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::wire;

    #[test]
    fn question_payload_lists_options_in_order() {
        let question = Question {
            id: 7,
            text: "Who is the captain?".into(),
            options: ["Daichi".into(), "Hinata".into(), "Kageyama".into(), "Tanaka".into()],
            correct: 1,
        };
        let response = Response::YourQuestion(question);
        assert_eq!(response.command(), Command::YourQuestion);
        assert_eq!(response.payload(), "7#Who is the captain?#Daichi#Hinata#Kageyama#Tanaka");
    }

    #[test]
    fn score_table_has_a_line_per_user() {
        let table = vec![("alice".to_owned(), 10), ("bob".to_owned(), 0)];
        assert_eq!(Response::AllScore(table).payload(), "alice: 10\nbob: 0\n");
    }

    #[test]
    fn errors_carry_their_message() {
        let frame = Response::Error(GameError::IncorrectPassword).encode().unwrap();
        let message = wire::decode(&frame).unwrap();
        assert_eq!(message.command, Command::Error);
        assert_eq!(message.payload, "Incorrect password");
    }

    #[test]
    fn logged_users_are_comma_joined() {
        let names = vec!["alice".to_owned(), "bob".to_owned()];
        assert_eq!(Response::LoggedAnswer(names).payload(), "alice, bob");
        assert_eq!(Response::LoggedAnswer(vec![]).payload(), "");
    }

    #[test]
    fn oversized_responses_fail_to_encode() {
        let table = (0..2000).map(|i| (format!("user{i}"), i)).collect();
        assert_eq!(Response::AllScore(table).encode(), Err(FramingError::PayloadTooLong));
    }
}
