//! Where users and questions come from.
//!
//! The game only needs a snapshot of each at start-up, so a store is anything that
//! can produce one. [`FileStore`] reads either JSON or the line-oriented text format:
//!
//! ```text
//! users:     username|password|score|1,4,7
//! questions: text|option 1|option 2|option 3|option 4|correct
//! ```
//!
//! Text questions are numbered from 1 in file order.
use crate::error::StoreError;
use crate::game::{Question, QuestionId, User};
use std::path::PathBuf;

pub trait UserStore {
    fn load(&self) -> Result<Vec<User>, StoreError>;
}

pub trait QuestionStore {
    fn load(&self) -> Result<Vec<Question>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
    fn is_json(&self) -> bool {
        self.path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
    }
    fn read(&self) -> Result<String, StoreError> {
        std::fs::read_to_string(&self.path)
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }
    fn from_json<T: serde::de::DeserializeOwned>(&self, text: &str) -> Result<T, StoreError> {
        serde_json::from_str(text)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })
    }
    /// Non-blank lines split on `|`, with their 1-based line numbers.
    fn records<'a, const N: usize>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = Result<(usize, [&'a str; N]), StoreError>> + 'a {
        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(move |(i, line)| {
                let line = line.trim_end_matches('\r');
                let fields: Vec<&str> = line.split('|').collect();
                <[&str; N]>::try_from(fields).map(|fields| (i + 1, fields)).map_err(|fields| {
                    let reason = format!("expected {N} fields, found {}", fields.len());
                    self.parse_error(i + 1, reason)
                })
            })
    }
    fn parse_error(&self, line: usize, reason: impl Into<String>) -> StoreError {
        StoreError::Parse { path: self.path.clone(), line, reason: reason.into() }
    }
}

impl UserStore for FileStore {
    fn load(&self) -> Result<Vec<User>, StoreError> {
        let text = self.read()?;
        if self.is_json() {
            return self.from_json(&text);
        }
        self.records::<4>(&text)
            .map(|record| -> Result<User, StoreError> {
                let (line, [username, password, score, asked]) = record?;
                let score = score
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| self.parse_error(line, format!("bad score {score:?}: {e}")))?;
                let questions_asked = asked
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(|id| id.parse::<QuestionId>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| {
                        self.parse_error(line, format!("bad question list {asked:?}: {e}"))
                    })?;
                Ok(User {
                    username: username.to_owned(),
                    password: password.to_owned(),
                    score,
                    questions_asked,
                })
            })
            .collect()
    }
}

impl QuestionStore for FileStore {
    fn load(&self) -> Result<Vec<Question>, StoreError> {
        let text = self.read()?;
        if self.is_json() {
            return self.from_json(&text);
        }
        self.records::<6>(&text)
            .zip(1u32..)
            .map(|(record, id)| -> Result<Question, StoreError> {
                let (line, [question, o1, o2, o3, o4, correct]) = record?;
                let correct = correct
                    .trim()
                    .parse::<u8>()
                    .map_err(|e| {
                        self.parse_error(line, format!("bad correct option {correct:?}: {e}"))
                    })?;
                Ok(Question {
                    id,
                    text: question.to_owned(),
                    options: [o1, o2, o3, o4].map(str::to_owned),
                    correct,
                })
            })
            .collect()
    }
}
