mod collections;
pub mod config;
pub mod error;
pub mod game;
pub mod network;
pub mod store;

pub use config::Config;
pub use game::Game;
pub use network::Network;

mod prelude {
    pub(crate) use crate::collections::*;
    pub(crate) use crate::error::*;
    pub(crate) use crate::network::{client::Inbox, wire::Command, Response};
    pub(crate) use std::io;
    pub(crate) use std::net::TcpStream;
}
