//! Avalon Sim - run seeded all-bot games and report outcomes

use std::collections::BTreeMap;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use avalon_engine::core::{BotConfig, BotKnowledge, EngineConfig, Participant, PlayerId};
use avalon_engine::game::GameSession;
use avalon_engine::roles::Alignment;

const BOT_NAMES: [&str; 5] = ["Arthur", "Guinevere", "Lancelot", "Uther", "Galahad"];

#[derive(Parser)]
#[command(name = "avalon-sim")]
#[command(about = "Play all-bot games and tally who wins")]
struct Cli {
    /// Seed of the first game; game n uses seed + n
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Number of games to play
    #[arg(short, long, default_value_t = 100)]
    games: u64,

    /// JSON engine configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Bots only know what their role reveal showed them
    #[arg(long)]
    vision_gated: bool,

    /// Keep the configured bot delays instead of playing instantly
    #[arg(long)]
    real_delays: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            EngineConfig::from_json_str(&text).with_context(|| format!("loading {path}"))?
        }
        None => EngineConfig::default(),
    };

    if !cli.real_delays {
        config.bots = BotConfig {
            knowledge: config.bots.knowledge,
            ..BotConfig::instant()
        };
    }
    if cli.vision_gated {
        config.bots = config.bots.with_knowledge(BotKnowledge::VisionGated);
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = load_config(&cli)?;
    let roster: Vec<Participant> = (0u8..)
        .zip(BOT_NAMES)
        .map(|(i, name)| Participant::bot(PlayerId::new(i), name))
        .collect();

    let mut wins: BTreeMap<String, u64> = BTreeMap::new();
    let mut reasons: BTreeMap<String, u64> = BTreeMap::new();
    let mut virtual_ms = 0u64;

    for n in 0..cli.games {
        let seed = cli.seed.wrapping_add(n);
        let mut session = GameSession::new(config.clone(), roster.clone(), seed)
            .with_context(|| format!("starting game with seed {seed}"))?;
        session.run_until_idle();

        let result = session
            .result()
            .with_context(|| format!("game with seed {seed} did not finish"))?;
        *wins.entry(result.winner.to_string()).or_default() += 1;
        *reasons.entry(format!("{:?}", result.reason)).or_default() += 1;
        virtual_ms += session.now();
    }

    println!("Played {} game(s) from seed {}", cli.games, cli.seed);
    for side in [Alignment::Good, Alignment::Evil] {
        let count = wins.get(&side.to_string()).copied().unwrap_or(0);
        println!("  {side:<5} {count:>6}");
    }
    println!("By reason:");
    for (reason, count) in &reasons {
        println!("  {reason:<20} {count:>6}");
    }
    if cli.real_delays && cli.games > 0 {
        println!("Mean virtual game length: {} ms", virtual_ms / cli.games);
    }

    Ok(())
}
