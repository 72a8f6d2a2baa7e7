use anyhow::Context;
use clap::Parser;
use quizserv::{store::FileStore, Config, Game, Network};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::parse();
    log::info!("Welcome to the Haikyuu Trivia Server! (quizserv {})", env!("CARGO_PKG_VERSION"));

    let users = FileStore::new(&config.users);
    let questions = FileStore::new(&config.questions);
    let mut game = Game::load(&users, &questions).context("unable to load the quiz")?;

    let address = config.address();
    let mut network = Network::bind(&address)
        .with_context(|| format!("unable to listen on {address}"))?
        .with_outbound_limit(config.outbound_limit);
    network.run(&mut game).context("network down")?;
    Ok(())
}
