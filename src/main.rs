//! Command-line front end: searches a tic-tac-toe position and prints the
//! statistics of the root.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use uct::games::tictactoe::{Board, Player, TicTacToe};
use uct::mcts::{Config, Searcher, EXPLORATION};
use uct::play::Game;

/// Searches a tic-tac-toe position with Monte Carlo Tree Search and prints the
/// statistics of every candidate move.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Position to search: 9 cells in row-major order, `x`, `o` or `.` for an
    /// empty cell (e.g. `x.o/.x./...`).
    #[arg(long, default_value = ".........")]
    board: String,
    /// Number of iterations. Defaults to 10000 when no time limit is given.
    #[arg(long)]
    iterations: Option<u64>,
    /// Time limit in milliseconds.
    #[arg(long)]
    time_ms: Option<u64>,
    /// Exploration constant of the UCT formula.
    #[arg(long, default_value_t = EXPLORATION)]
    exploration: f64,
    /// Seed of the rollout random number generator.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
    /// Print version and build information first.
    #[arg(long)]
    info: bool,
    /// Play the game out from the board instead of analysing it. Human moves
    /// are read from stdin as `column,row`.
    #[arg(long, value_enum)]
    play: Option<Opponent>,
}

/// Who the engine plays against in `--play` mode.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Opponent {
    /// The engine plays both sides.
    #[value(name = "self")]
    Engine,
    /// A human plays x.
    X,
    /// A human plays o.
    O,
}

impl Opponent {
    const fn human(self) -> Option<Player> {
        match self {
            Self::Engine => None,
            Self::X => Some(Player::X),
            Self::O => Some(Player::O),
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default()
            .with_exploration(self.exploration)
            .with_seed(self.seed);
        if let Some(time_ms) = self.time_ms {
            config.iterations = None;
            config = config.with_time(Duration::from_millis(time_ms));
        }
        if let Some(iterations) = self.iterations {
            config = config.with_iterations(iterations);
        }
        config
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if cli.info {
        uct::print_engine_info();
        uct::print_binary_info();
    }

    let board = Board::try_from(cli.board.as_str())?;
    let config = cli.config();
    info!(?config, "starting search");

    if let Some(opponent) = cli.play {
        let mut input = io::stdin().lock();
        let mut output = io::stdout().lock();
        let _ = Game::new(board, opponent.human(), config, &mut input, &mut output).play()?;
        return Ok(());
    }

    let mut searcher =
        Searcher::new(TicTacToe, board, config).context("invalid search configuration")?;
    let stats = searcher.run()?;

    let mut output = io::stdout().lock();
    searcher.report(&mut output)?;
    writeln!(
        output,
        "info iterations {} time {}",
        stats.iterations,
        stats.elapsed.as_millis()
    )?;
    Ok(())
}
