//! Plays a complete game of tic-tac-toe. The engine picks each of its moves
//! with a fresh search from the current board, a human player (if any) types
//! moves on the input stream.
//!
//! [`Game::play`] is the main loop: it prints the board after every move and
//! announces the result once the game is over.

use std::fmt;
use std::io::{BufRead, Write};

use anyhow::bail;
use tracing::debug;

use crate::environment::Environment;
use crate::games::tictactoe::{Board, Cell, Player, TicTacToe};
use crate::mcts::{Config, Searcher};

/// Result of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The player completed a line.
    Win(Player),
    /// The board is full and nobody completed a line.
    Draw,
}

impl Outcome {
    /// Returns `None` while the game is still going.
    #[must_use]
    pub fn of(board: &Board) -> Option<Self> {
        match board.winner() {
            Some(player) => Some(Self::Win(player)),
            None if board.is_full() => Some(Self::Draw),
            None => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Win(player) => write!(f, "{player} wins"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// A game between the engine and a human or between two copies of the
/// engine.
pub struct Game<'a, R: BufRead, W: Write> {
    board: Board,
    human: Option<Player>,
    config: Config,
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> Game<'a, R, W> {
    /// Creates a game starting at `board`. The `human` side reads its moves
    /// from `input`; with `None` the engine plays both sides and `input` is
    /// never read. Every engine move is searched with `config`.
    #[must_use]
    pub fn new(
        board: Board,
        human: Option<Player>,
        config: Config,
        input: &'a mut R,
        output: &'a mut W,
    ) -> Self {
        Self {
            board,
            human,
            config,
            input,
            output,
        }
    }

    /// The current position.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Alternates moves until the game is over and returns its result.
    ///
    /// Human moves are `column,row` pairs, one per line. Illegal or malformed
    /// moves are reported and asked again.
    ///
    /// # Errors
    ///
    /// Fails if the input ends before the game is over, if writing to the
    /// output fails or if the search configuration is invalid.
    pub fn play(&mut self) -> anyhow::Result<Outcome> {
        write!(self.output, "{}", self.board)?;
        loop {
            if let Some(outcome) = Outcome::of(&self.board) {
                self.announce(outcome)?;
                return Ok(outcome);
            }
            let player = self.board.to_move();
            let cell = if self.human == Some(player) {
                self.human_move()?
            } else {
                self.engine_move()?
            };
            self.board = self.board.place(cell);
            writeln!(self.output, "move {player} {cell}")?;
            write!(self.output, "{}", self.board)?;
        }
    }

    /// Searches the current position from scratch and returns the move with
    /// the best average reward.
    fn engine_move(&mut self) -> anyhow::Result<Cell> {
        let mut searcher = Searcher::new(TicTacToe, self.board, self.config.clone())?;
        let stats = searcher.run()?;
        let cell = *searcher.recommended_action()?;
        debug!(%cell, iterations = stats.iterations, "engine move");
        Ok(cell)
    }

    fn human_move(&mut self) -> anyhow::Result<Cell> {
        let legal = TicTacToe.legal_actions(&self.board);
        loop {
            write!(self.output, "your move: ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                bail!("input ended before the game was over");
            }
            match line.parse::<Cell>() {
                Ok(cell) if legal.contains(&cell) => return Ok(cell),
                _ => writeln!(self.output, "invalid move: {}", line.trim())?,
            }
        }
    }

    fn announce(&mut self, outcome: Outcome) -> anyhow::Result<()> {
        writeln!(self.output, "result {outcome}")?;
        if let Some(human) = self.human {
            let verdict = match outcome {
                Outcome::Win(player) if player == human => "you win",
                Outcome::Win(_) => "you lose",
                Outcome::Draw => "tie",
            };
            writeln!(self.output, "{verdict}")?;
        }
        Ok(())
    }
}
