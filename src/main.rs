/// Entry point: load config, ask for the player's mood, run levels.

mod config;
mod domain;
mod sim;
mod ui;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_pcg::Pcg32;

use config::GameConfig;
use domain::sentiment::LexiconClassifier;
use sim::level::{ask_emotion, run_game, GameSummary};
use ui::shell::TerminalShell;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(summary) => {
            println!();
            println!("Thanks for playing Mirror World!");
            println!(
                "Mood: {}  Levels cleared: {}  (last: level {}, {:?})",
                summary.emotion, summary.levels_cleared, summary.last.level, summary.last.phase
            );
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<GameSummary> {
    let config = GameConfig::load();
    let rules = config.rules;
    rules.validate().context("invalid config.toml")?;

    let seed = config.seed.unwrap_or_else(rand::random);
    log::info!("rng seed {seed}");
    let mut rng = Pcg32::seed_from_u64(seed);

    let classifier = LexiconClassifier::new().with_words(&config.sentiment_words);

    let mut shell = TerminalShell::init(&config.gamepad).context("terminal init failed")?;

    let result = ask_emotion(&mut shell, &classifier)
        .map_err(anyhow::Error::from)
        .and_then(|emotion| run_game(&mut shell, &mut rng, &rules, emotion).map_err(anyhow::Error::from));

    shell.cleanup().context("terminal cleanup failed")?;
    result.context("game aborted")
}
