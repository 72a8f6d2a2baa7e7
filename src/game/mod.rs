//! The quiz itself: logins, question handout, answers and scores.
use crate::network::{wire::Message, Request};
use crate::prelude::*;
use crate::store::{QuestionStore, UserStore};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

mod sessions;

pub use sessions::{ConnId, Sessions};

pub type QuestionId = u32;

/// Points for a correct answer.
pub const POINTS_PER_ANSWER: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "question")]
    pub text: String,
    #[serde(rename = "answers")]
    pub options: [String; 4],
    /// 1-based index into `options`.
    pub correct: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub score: u32,
    /// Questions handed out so far, oldest first.
    #[serde(default)]
    pub questions_asked: Vec<QuestionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    /// Carries the right option.
    Wrong(u8),
}

pub struct Game {
    /// In store order, which is also leaderboard order.
    users: Vec<User>,
    by_name: HashMap<String, usize>,
    questions: BTreeMap<QuestionId, Question>,
    sessions: Sessions,
    rng: StdRng,
}

impl Game {
    pub fn new(users: Vec<User>, questions: Vec<Question>) -> Result<Self, StoreError> {
        let mut by_name = HashMap::with_capacity(users.len());
        for (i, user) in users.iter().enumerate() {
            if by_name.insert(user.username.clone(), i).is_some() {
                return Err(StoreError::Duplicate { kind: "username", key: user.username.clone() });
            }
        }
        let mut bank = BTreeMap::new();
        for question in questions {
            if !(1..=4).contains(&question.correct) {
                return Err(StoreError::InvalidQuestion {
                    id: question.id,
                    reason: "correct option must be 1-4",
                });
            }
            let id = question.id;
            if bank.insert(id, question).is_some() {
                return Err(StoreError::Duplicate { kind: "question", key: id.to_string() });
            }
        }
        Ok(Self {
            users,
            by_name,
            questions: bank,
            sessions: Sessions::default(),
            rng: StdRng::from_entropy(),
        })
    }
    pub fn load(
        users: &impl UserStore,
        questions: &impl QuestionStore,
    ) -> Result<Self, StoreError> {
        let game = Self::new(users.load()?, questions.load()?)?;
        log::info!("loaded {} users and {} questions", game.users.len(), game.questions.len());
        Ok(game)
    }
    /// Makes question selection reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.by_name.get(username).map(|&i| &self.users[i])
    }
    fn user_mut(&mut self, username: &str) -> Option<&mut User> {
        self.by_name.get(username).map(|&i| &mut self.users[i])
    }
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.get(&id)
    }
    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Runs one inbound message and queues the reply, if there is one.
    pub fn handle(&mut self, conn: ConnId, message: &Message, mut inbox: Inbox) {
        if let Some(response) = self.respond(conn, message) {
            inbox.submit(response);
        }
    }

    /// The reply to `message` arriving on `conn`. `LOGOUT` gets none.
    pub fn respond(&mut self, conn: ConnId, message: &Message) -> Option<Response> {
        let request = Request::parse(message);
        let Some(username) = self.sessions.username(conn).map(str::to_owned) else {
            // only logging in is allowed before logging in
            return Some(match request {
                Ok(Request::Login { username, password }) => {
                    match self.login(conn, &username, &password) {
                        Ok(()) => Response::LoginOk(),
                        Err(e) => Response::Error(e),
                    }
                }
                Err(e) if message.command == Command::Login => Response::Error(e.into()),
                _ => Response::Error(GameError::NotConnected),
            });
        };
        let request = match request {
            Ok(request) => request,
            Err(e) => return Some(Response::Error(e.into())),
        };
        Some(match request {
            Request::Login { .. } => Response::Error(GameError::UnrecognisedCommand),
            Request::Logout => {
                self.sessions.logout(conn);
                log::info!("{username} logged out");
                return None;
            }
            Request::MyScore => Response::YourScore(self.user(&username).map_or(0, |u| u.score)),
            Request::Highscore => Response::AllScore(self.scores()),
            Request::Logged => {
                Response::LoggedAnswer(self.sessions.usernames().map(str::to_owned).collect())
            }
            Request::GetQuestion => match self.next_question(&username) {
                Some(id) => Response::YourQuestion(self.questions[&id].clone()),
                None => Response::NoQuestions(),
            },
            Request::SendAnswer { question, choice } => {
                match self.answer(&username, &question, &choice) {
                    Ok(Verdict::Correct) => Response::CorrectAnswer(),
                    Ok(Verdict::Wrong(correct)) => Response::WrongAnswer(correct),
                    Err(e) => Response::Error(e),
                }
            }
        })
    }

    /// Checks credentials and opens a session for `username` on `conn`.
    pub fn login(&mut self, conn: ConnId, username: &str, password: &str) -> Result<(), GameError> {
        if self.sessions.connection_of(username).is_some() {
            return Err(GameError::UserAlreadyLoggedIn);
        }
        let user = self.user(username).ok_or(GameError::UnrecognisedUsername)?;
        if user.password != password {
            return Err(GameError::IncorrectPassword);
        }
        self.sessions.login(conn, username)?;
        log::info!("{username} logged in on connection {conn}");
        Ok(())
    }

    /// Drops whatever session `conn` held. Scores already awarded stay.
    pub fn disconnect(&mut self, conn: ConnId) {
        if let Some(username) = self.sessions.logout(conn) {
            log::info!("{username} dropped off");
        }
    }

    pub fn scores(&self) -> Vec<(String, u32)> {
        self.users.iter().map(|u| (u.username.clone(), u.score)).collect()
    }

    /// Picks a question `username` hasn't been asked and records it as asked.
    ///
    /// The very first question is always the lowest id. `None` once the bank is
    /// exhausted, in which case nothing changes.
    pub fn next_question(&mut self, username: &str) -> Option<QuestionId> {
        let &i = self.by_name.get(username)?;
        let user = &mut self.users[i];
        let candidate = if user.questions_asked.is_empty() {
            self.questions.keys().next().copied()
        } else {
            let mut ids: Vec<QuestionId> = self.questions.keys().copied().collect();
            ids.shuffle(&mut self.rng);
            ids.into_iter().find(|id| !user.questions_asked.contains(id))
        };
        let id = candidate?;
        user.questions_asked.push(id);
        Some(id)
    }

    /// Scores an answer. An unreadable choice takes back the last question handed
    /// out, so it can come up again.
    pub fn answer(
        &mut self,
        username: &str,
        question: &str,
        choice: &str,
    ) -> Result<Verdict, GameError> {
        let Some(choice) = parse_choice(choice) else {
            if let Some(user) = self.user_mut(username) {
                user.questions_asked.pop();
            }
            return Err(GameError::InvalidAnswer);
        };
        let correct = question
            .trim()
            .parse::<QuestionId>()
            .ok()
            .and_then(|id| self.questions.get(&id))
            .ok_or(GameError::UnknownQuestion)?
            .correct;
        if choice != correct {
            return Ok(Verdict::Wrong(correct));
        }
        let user = self.user_mut(username).ok_or(GameError::NotConnected)?;
        user.score = user.score.saturating_add(POINTS_PER_ANSWER);
        Ok(Verdict::Correct)
    }
}

/// `1`-`4`, or the number spelled out in any case.
pub fn parse_choice(choice: &str) -> Option<u8> {
    let choice = choice.trim();
    if let Ok(n) = choice.parse::<i64>() {
        return (1..=4).contains(&n).then_some(n as u8);
    }
    match choice.to_ascii_lowercase().as_str() {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        "four" => Some(4),
        _ => None,
    }
}
