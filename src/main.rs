use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use snake_2048::driver::{play, Game};
use snake_2048::engine::{Board, DEFAULT_SIZE};
use snake_2048::expectimax::{
    explain, Expectimax, ExpectimaxConfig, ExpectimaxParallel, HeuristicKind, Policy, DEFAULT_DEPTH,
};
use snake_2048::trace::trace_top_level_scores;
use snake_2048::weights::{HeuristicWeights, Preset};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let weights = cli.tuning.resolve_weights()?;
    match cli.cmd.unwrap_or(Cmd::Play(cli.play)) {
        Cmd::Play(args) => run_play(&cli.tuning, weights, &args),
        Cmd::Trace { board, max_depth, leaves } => run_trace(&board, &weights, max_depth, leaves),
        Cmd::Explain { board } => run_explain(&board, &weights),
        Cmd::Weights => {
            print!("{weights}");
            Ok(())
        }
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug, Parser)]
#[command(name = "snake-2048", about = "2048 Expectimax advisor with a tunable snake heuristic")]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Cmd>,

    #[command(flatten)]
    tuning: Tuning,

    /// Play options used when no subcommand is given
    #[command(flatten)]
    play: PlayArgs,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Play a full game with the Expectimax advisor (default)
    Play(PlayArgs),
    /// Trace every leaf under each root direction of a position
    Trace {
        /// Row-major cell values, e.g. "2,0,0,0 0,4,0,0 0,0,0,0 0,0,0,0"
        #[arg(long)]
        board: String,
        /// Whole turns to trace below each root move
        #[arg(long, default_value_t = 1)]
        max_depth: u32,
        /// Print every traced leaf, not just the per-direction summary
        #[arg(long)]
        leaves: bool,
    },
    /// Break down the heuristic score of a position
    Explain {
        /// Row-major cell values
        #[arg(long)]
        board: String,
    },
    /// Print the resolved heuristic weights
    Weights,
}

/// Weight and search tuning. Weight sources apply in flag order:
/// file, preset, strength, then individual `--set` overrides.
#[derive(Debug, Args)]
struct Tuning {
    /// TOML file with heuristic weights; missing keys keep their defaults
    #[arg(long, global = true)]
    weights: Option<PathBuf>,

    /// Named weight preset
    #[arg(long, global = true, value_enum)]
    preset: Option<Preset>,

    /// Snake strength from 1 (weak) to 5 (extreme)
    #[arg(long, global = true)]
    strength: Option<u8>,

    /// Override a single weight, e.g. --set snake_bonus=4 (repeatable)
    #[arg(long = "set", global = true, value_parser = parse_key_val)]
    overrides: Vec<(String, f64)>,

    /// Leaf evaluation used by the search
    #[arg(long, global = true, value_enum, default_value_t = HeuristicKind::Configurable)]
    heuristic: HeuristicKind,

    /// Whole player turns searched below the root
    #[arg(long, global = true, default_value_t = DEFAULT_DEPTH)]
    depth: u32,
}

impl Tuning {
    fn resolve_weights(&self) -> Result<HeuristicWeights> {
        let mut w = match &self.weights {
            Some(path) => HeuristicWeights::load(path)
                .with_context(|| format!("loading weights from {}", path.display()))?,
            None => HeuristicWeights::default(),
        };
        if let Some(preset) = self.preset {
            w.apply_preset(preset);
        }
        if let Some(level) = self.strength {
            w.set_snake_strength(level)?;
        }
        for (key, value) in &self.overrides {
            w.set(key, *value)?;
        }
        Ok(w)
    }
}

#[derive(Debug, Clone, Args)]
struct PlayArgs {
    /// Seed for reproducible games
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many moves
    #[arg(long)]
    steps: Option<u64>,

    /// Board width and height
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Search root directions on the rayon pool
    #[arg(long)]
    parallel: bool,

    /// Suppress the status line and final board
    #[arg(long)]
    quiet: bool,
}

fn parse_key_val(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got {s:?}"))?;
    let value = value.trim().parse::<f64>().map_err(|e| format!("invalid value for {key}: {e}"))?;
    Ok((key.trim().to_string(), value))
}

fn parse_board(s: &str) -> Result<Board> { Board::parse(s).with_context(|| format!("parsing board {s:?}")) }

fn run_play(tuning: &Tuning, weights: HeuristicWeights, args: &PlayArgs) -> Result<()> {
    ensure!(args.size > 0, "board size must be positive");
    ensure!(
        tuning.heuristic != HeuristicKind::CornerSnake || args.size == 4,
        "the corner-snake heuristic only supports 4x4 boards"
    );
    let cfg = ExpectimaxConfig { depth: tuning.depth, weights, heuristic: tuning.heuristic };
    let mut policy: Box<dyn Policy> = if args.parallel {
        Box::new(ExpectimaxParallel::with_config(cfg))
    } else {
        Box::new(Expectimax::with_config(cfg))
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!(seed = ?args.seed, depth = tuning.depth, parallel = args.parallel, heuristic = ?tuning.heuristic, "starting game");

    let mut game = Game::new(args.size, &mut rng);
    let pb = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Moves: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    };

    let start = Instant::now();
    let summary = play(&mut game, policy.as_mut(), &mut rng, args.steps, |g| {
        if let Some(pb) = &pb {
            pb.set_message(format!("{} | score: {} | max tile: {}", g.moves(), g.board().score(), g.board().highest_tile()));
        }
    });
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let elapsed = start.elapsed().as_secs_f64().max(1e-6);
    if !args.quiet {
        println!("{}", game.board());
    }
    println!(
        "Moves: {} | moves/sec: {:.1} | score: {} | highest tile: {} | nodes: {}",
        summary.moves,
        summary.moves as f64 / elapsed,
        summary.score,
        summary.highest_tile,
        summary.nodes
    );
    Ok(())
}

fn run_trace(board: &str, weights: &HeuristicWeights, max_depth: u32, leaves: bool) -> Result<()> {
    let board = parse_board(board)?;
    let report = trace_top_level_scores(&board, weights, max_depth);
    if leaves {
        print!("{report}");
        return Ok(());
    }
    println!("Leaves traced: {}", report.leaves.len());
    for (dir, score) in report.summary() {
        println!("  {dir} : {score}");
    }
    match report.recommended() {
        Some((dir, score)) => println!("Recommended direction: {dir} (score: {score:.3e})"),
        None => println!("No valid directions available"),
    }
    Ok(())
}

fn run_explain(board: &str, weights: &HeuristicWeights) -> Result<()> {
    let board = parse_board(board)?;
    let ex = explain(&board, weights);
    println!("{board}");
    println!("base score: {}", ex.base_score);
    for line in &ex.components {
        println!("  {line}");
    }
    println!("final score: {:.3e}", ex.final_score);
    Ok(())
}
