use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;

use isolation::enums::PLAYERS;
use isolation::players::PlayerKind;
use isolation::{play_game, EndReason, GameState, IsolationResult, SearchConfig};

/// Pits two Isolation strategies against each other.
#[derive(Parser, Debug)]
#[command(name = "simulate", version, about)]
struct Args {
    /// Strategy moving first
    #[arg(long, value_enum, default_value = "alphabeta")]
    player_one: PlayerKind,

    /// Strategy moving second
    #[arg(long, value_enum, default_value = "mcts")]
    player_two: PlayerKind,

    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 1)]
    games: u32,

    /// Per-move time limit in milliseconds
    #[arg(long, default_value_t = 150)]
    time_limit_ms: u64,

    #[arg(long, default_value_t = 7)]
    width: usize,

    #[arg(long, default_value_t = 7)]
    height: usize,

    /// JSON search configuration shared by both players
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base seed for the randomized players, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Print every game outcome as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> IsolationResult<()> {
    env_logger::init();
    let args = Args::parse();

    let base_config = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    let board = GameState::new(args.width, args.height)?;
    let time_limit = Duration::from_millis(args.time_limit_ms);

    println!("Isolation Simulation");
    println!("====================");
    println!("  - Player one: {:?}", args.player_one);
    println!("  - Player two: {:?}", args.player_two);
    println!("  - Board: {}x{}", args.width, args.height);
    println!("  - Games: {}", args.games);
    println!("  - Time limit: {:?}", time_limit);

    let base_seed = args.seed.or(base_config.seed);
    let mut wins = [0u32; 2];
    let mut forfeits = 0u32;
    let mut total_moves = 0usize;
    let started = Instant::now();

    for game_num in 0..args.games {
        let seed_for =
            |offset: u64| base_seed.map(|seed| seed.wrapping_add(u64::from(game_num) * 2 + offset));
        let mut one = args.player_one.build(&with_seed(&base_config, seed_for(0)));
        let mut two = args.player_two.build(&with_seed(&base_config, seed_for(1)));

        let outcome = play_game(board.clone(), [one.as_mut(), two.as_mut()], time_limit);

        wins[outcome.winner.index()] += 1;
        total_moves += outcome.history.len();
        if outcome.reason != EndReason::NoLegalMoves {
            forfeits += 1;
        }

        if args.json {
            match serde_json::to_string(&outcome) {
                Ok(json) => println!("{}", json),
                Err(err) => log::error!("cannot serialize outcome: {}", err),
            }
        } else if args.games > 1 {
            println!(
                "Game {}: {} wins ({:?}) after {} moves",
                game_num + 1,
                outcome.winner,
                outcome.reason,
                outcome.history.len()
            );
        } else {
            print!("{}", outcome.final_state);
            println!("{} wins ({:?})", outcome.winner, outcome.reason);
        }
    }

    if args.games > 0 {
        println!("\nResults");
        println!("=======");
        let kinds = [args.player_one, args.player_two];
        for player in PLAYERS {
            let count = wins[player.index()];
            println!(
                "{} ({:?}): {} wins ({:.1}%)",
                player,
                kinds[player.index()],
                count,
                count as f64 / args.games as f64 * 100.0
            );
        }
        println!("Forfeits: {}", forfeits);
        println!(
            "Average moves per game: {:.1}",
            total_moves as f64 / args.games as f64
        );
        println!("Total time: {:?}", started.elapsed());
    }

    Ok(())
}

fn with_seed(config: &SearchConfig, seed: Option<u64>) -> SearchConfig {
    match seed {
        Some(seed) => config.clone().with_seed(seed),
        None => config.clone(),
    }
}
