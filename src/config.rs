use clap::Parser;
use std::path::PathBuf;

/// Serves trivia questions to many clients over one socket each.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct Config {
    /// IP address to listen on
    #[clap(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
    /// Port to listen on
    #[clap(short, long, default_value = "1984")]
    pub port: u16,
    /// User database, `.json` or `username|password|score|asked` lines
    #[clap(short, long, default_value = "users.txt")]
    pub users: PathBuf,
    /// Question bank, `.json` or `question|o1|o2|o3|o4|correct` lines
    #[clap(short, long, default_value = "questions.txt")]
    pub questions: PathBuf,
    /// Bytes of replies a client may leave unread before it's disconnected
    #[clap(long, default_value_t = crate::network::DEFAULT_OUTBOUND_LIMIT)]
    pub outbound_limit: usize,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
