//! [Tic-tac-toe] rules: two players alternately mark cells of a 3x3 grid, the
//! first one to complete a row, a column or a diagonal wins. Perfect play from
//! both sides always ends in a draw, which makes the game a convenient sanity
//! check for the search.
//!
//! [Tic-tac-toe]: https://en.wikipedia.org/wiki/Tic-tac-toe

use std::fmt;
use std::ops::Not;
use std::str::FromStr;

use anyhow::bail;
use arrayvec::ArrayVec;
use itertools::Itertools;

use crate::environment::{Environment, Rewards, Role};

/// Number of cells in a row or a column.
pub const BOARD_WIDTH: u8 = 3;
/// Total number of cells.
pub const BOARD_SIZE: usize = (BOARD_WIDTH * BOARD_WIDTH) as usize;

/// X always moves first.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    const fn symbol(self) -> char {
        match self {
            Self::X => 'x',
            Self::O => 'o',
        }
    }

    /// Role index used by the search: X is role 0, O is role 1.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::X => 0,
            Self::O => 1,
        }
    }
}

impl Not for Player {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

bitflags::bitflags! {
    /// A set of cells, one bit per cell in row-major order:
    ///
    /// ```text
    /// 0 | 1 | 2
    /// ---------
    /// 3 | 4 | 5
    /// ---------
    /// 6 | 7 | 8
    /// ```
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Cells: u16 {
        #[allow(missing_docs)]
        const TOP_LEFT = 1 << 0;
        #[allow(missing_docs)]
        const TOP = 1 << 1;
        #[allow(missing_docs)]
        const TOP_RIGHT = 1 << 2;
        #[allow(missing_docs)]
        const LEFT = 1 << 3;
        #[allow(missing_docs)]
        const CENTER = 1 << 4;
        #[allow(missing_docs)]
        const RIGHT = 1 << 5;
        #[allow(missing_docs)]
        const BOTTOM_LEFT = 1 << 6;
        #[allow(missing_docs)]
        const BOTTOM = 1 << 7;
        #[allow(missing_docs)]
        const BOTTOM_RIGHT = 1 << 8;
    }
}

/// Rows, columns and diagonals: completing any of them wins the game.
const LINES: [Cells; 8] = [
    Cells::TOP_LEFT.union(Cells::TOP).union(Cells::TOP_RIGHT),
    Cells::LEFT.union(Cells::CENTER).union(Cells::RIGHT),
    Cells::BOTTOM_LEFT.union(Cells::BOTTOM).union(Cells::BOTTOM_RIGHT),
    Cells::TOP_LEFT.union(Cells::LEFT).union(Cells::BOTTOM_LEFT),
    Cells::TOP.union(Cells::CENTER).union(Cells::BOTTOM),
    Cells::TOP_RIGHT.union(Cells::RIGHT).union(Cells::BOTTOM_RIGHT),
    Cells::TOP_LEFT.union(Cells::CENTER).union(Cells::BOTTOM_RIGHT),
    Cells::TOP_RIGHT.union(Cells::CENTER).union(Cells::BOTTOM_LEFT),
];

/// A single cell of the board, the action of placing a mark on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    column: u8,
    row: u8,
}

impl Cell {
    /// Creates a cell from zero-based coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is outside of the board.
    pub fn new(column: u8, row: u8) -> anyhow::Result<Self> {
        if column >= BOARD_WIDTH || row >= BOARD_WIDTH {
            bail!("cell ({column}, {row}) is outside of the board");
        }
        Ok(Self { column, row })
    }

    /// Zero-based column, left to right.
    #[must_use]
    pub const fn column(self) -> u8 {
        self.column
    }

    /// Zero-based row, top to bottom.
    #[must_use]
    pub const fn row(self) -> u8 {
        self.row
    }

    /// Index of the cell in row-major order.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.row * BOARD_WIDTH + self.column) as usize
    }

    const fn from_index(index: usize) -> Self {
        debug_assert!(index < BOARD_SIZE);
        Self {
            column: index as u8 % BOARD_WIDTH,
            row: index as u8 / BOARD_WIDTH,
        }
    }

    const fn bit(self) -> Cells {
        Cells::from_bits_retain(1 << self.index())
    }
}

impl FromStr for Cell {
    type Err = anyhow::Error;

    /// Parses `column,row`, `column row` or the displayed form `(column, row)`.
    fn from_str(input: &str) -> anyhow::Result<Self> {
        let coordinates: Vec<&str> = input
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .split(|symbol: char| symbol == ',' || symbol.is_whitespace())
            .filter(|token| !token.is_empty())
            .collect();
        let [column, row] = coordinates.as_slice() else {
            bail!("expected two coordinates, got '{input}'");
        };
        Self::new(column.parse()?, row.parse()?)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Position on the board. The player to move is derived from the number of
/// marks: X moves whenever both players have placed the same number of marks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Board {
    x: Cells,
    o: Cells,
}

impl Default for Cells {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    /// The starting position: all cells are empty.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            x: Cells::empty(),
            o: Cells::empty(),
        }
    }

    /// Cells marked by `player`.
    #[must_use]
    pub const fn marks(&self, player: Player) -> Cells {
        match player {
            Player::X => self.x,
            Player::O => self.o,
        }
    }

    /// Returns the mark at `cell`, if any.
    #[must_use]
    pub const fn at(&self, cell: Cell) -> Option<Player> {
        if self.x.contains(cell.bit()) {
            Some(Player::X)
        } else if self.o.contains(cell.bit()) {
            Some(Player::O)
        } else {
            None
        }
    }

    /// The player whose mark goes on the board next.
    #[must_use]
    pub const fn to_move(&self) -> Player {
        if self.x.bits().count_ones() == self.o.bits().count_ones() {
            Player::X
        } else {
            Player::O
        }
    }

    /// The player who completed a line, if any.
    #[must_use]
    pub fn winner(&self) -> Option<Player> {
        [Player::X, Player::O].into_iter().find(|&player| {
            let marks = self.marks(player);
            LINES.iter().any(|&line| marks.contains(line))
        })
    }

    /// Returns `true` if every cell is marked.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.x.union(self.o).is_all()
    }

    /// Cells without marks in row-major order.
    #[must_use]
    pub fn empty_cells(&self) -> ArrayVec<Cell, BOARD_SIZE> {
        let occupied = self.x.union(self.o);
        (0..BOARD_SIZE)
            .map(Cell::from_index)
            .filter(|cell| !occupied.contains(cell.bit()))
            .collect()
    }

    /// Places the mark of the player to move on `cell`.
    ///
    /// `cell` has to be empty.
    #[must_use]
    pub fn place(&self, cell: Cell) -> Self {
        debug_assert!(self.at(cell).is_none());
        let mut next = *self;
        match self.to_move() {
            Player::X => next.x.insert(cell.bit()),
            Player::O => next.o.insert(cell.bit()),
        }
        next
    }

    /// Parses the board from 9 cells in row-major order: `x`, `o` or `.` for
    /// an empty cell. Whitespace and `/` separators between rows are ignored,
    /// e.g. `"x.o/.x./..o"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has a wrong number of cells, unknown
    /// symbols or mark counts that can not occur in a game.
    pub fn from_cells(input: &str) -> anyhow::Result<Self> {
        let symbols: Vec<char> = input
            .chars()
            .filter(|symbol| !symbol.is_whitespace() && *symbol != '/')
            .collect();
        if symbols.len() != BOARD_SIZE {
            bail!(
                "board should have {BOARD_SIZE} cells, got {}: '{input}'",
                symbols.len()
            );
        }
        let mut board = Self::empty();
        for (index, symbol) in symbols.into_iter().enumerate() {
            let bit = Cell::from_index(index).bit();
            match symbol.to_ascii_lowercase() {
                'x' => board.x.insert(bit),
                'o' => board.o.insert(bit),
                '.' | '_' | '-' => (),
                _ => bail!("unknown cell symbol '{symbol}' in '{input}'"),
            }
        }
        let (x, o) = (board.x.bits().count_ones(), board.o.bits().count_ones());
        if x != o && x != o + 1 {
            bail!("x moves first: expected as many x as o or one more, got {x} x and {o} o");
        }
        let wins = |player: Player| {
            let marks = board.marks(player);
            LINES.iter().any(|&line| marks.contains(line))
        };
        match (wins(Player::X), wins(Player::O)) {
            (true, true) => bail!("both players completed a line in '{input}'"),
            // The game stops right after the winning mark.
            (true, false) if x != o + 1 => {
                bail!("x completed a line but o moved afterwards in '{input}'")
            }
            (false, true) if x != o => {
                bail!("o completed a line but x moved afterwards in '{input}'")
            }
            _ => Ok(board),
        }
    }
}

impl TryFrom<&str> for Board {
    type Error = anyhow::Error;

    fn try_from(input: &str) -> anyhow::Result<Self> {
        Self::from_cells(input)
    }
}

impl FromStr for Board {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> anyhow::Result<Self> {
        Self::from_cells(input)
    }
}

impl fmt::Display for Board {
    /// Prints the board row by row, each row on its own line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_WIDTH {
            let line = (0..BOARD_WIDTH)
                .map(|column| self.at(Cell { column, row }).map_or('.', Player::symbol))
                .join("");
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Tic-tac-toe rules for the search. Winning is worth `1`, losing `-1` and a
/// draw `0` for both players.
#[derive(Clone, Copy, Debug, Default)]
pub struct TicTacToe;

impl Environment<2> for TicTacToe {
    type State = Board;
    type Action = Cell;

    fn is_terminal(&self, board: &Board) -> bool {
        board.winner().is_some() || board.is_full()
    }

    fn evaluate_terminal(&self, board: &Board) -> Rewards<2> {
        match board.winner() {
            Some(Player::X) => [1.0, -1.0],
            Some(Player::O) => [-1.0, 1.0],
            None => [0.0, 0.0],
        }
    }

    fn active_role(&self, board: &Board) -> Role {
        board.to_move().role()
    }

    fn legal_actions(&self, board: &Board) -> Vec<Cell> {
        if board.winner().is_some() {
            return Vec::new();
        }
        board.empty_cells().into_iter().collect()
    }

    fn apply(&self, board: &Board, cell: &Cell) -> Board {
        board.place(*cell)
    }

    fn describe_state(&self, board: &Board) -> String {
        board.to_string()
    }

    fn describe_action(&self, cell: &Cell) -> String {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn board(cells: &str) -> Board {
        Board::try_from(cells).expect("valid board")
    }

    fn cell(column: u8, row: u8) -> Cell {
        Cell::new(column, row).expect("valid cell")
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(board(".........").to_string(), "...\n...\n...\n");
        assert_eq!(board("x.o/.x./..o").to_string(), "x.o\n.x.\n..o\n");
        assert_eq!(board("X O . _ - . x o x").to_string(), "xo.\n...\nxox\n");
        assert_eq!("xo.......".parse::<Board>().expect("valid board"), board("xo......."));
    }

    #[test]
    fn invalid_boards() {
        assert!(Board::try_from("........").is_err());
        assert!(Board::try_from("..........").is_err());
        assert!(Board::try_from("xx.......").is_err());
        assert!(Board::try_from("o........").is_err());
        assert!(Board::try_from("xq.......").is_err());
    }

    #[test]
    fn unreachable_wins() {
        // Both players can not have a line.
        assert!(Board::try_from("xxxooo...").is_err());
        // Nobody moves after the game is over.
        assert!(Board::try_from("xxxoo.o..").is_err());
        assert!(Board::try_from("ooox.xx.x").is_err());
        assert!(Board::try_from("xxxoo....").is_ok());
        assert!(Board::try_from("ooo.xx.x.").is_ok());
    }

    #[test]
    fn cells() {
        assert_eq!(cell(2, 1).index(), 5);
        assert_eq!(Cell::from_index(7), cell(1, 2));
        assert_eq!(cell(0, 2).to_string(), "(0, 2)");
        assert!(Cell::new(3, 0).is_err());
        assert!(Cell::new(0, 3).is_err());

        assert_eq!("2,1".parse::<Cell>().expect("valid cell"), cell(2, 1));
        assert_eq!(" 0 2 ".parse::<Cell>().expect("valid cell"), cell(0, 2));
        assert_eq!("(1, 0)".parse::<Cell>().expect("valid cell"), cell(1, 0));
        assert!("1".parse::<Cell>().is_err());
        assert!("1,2,0".parse::<Cell>().is_err());
        assert!("3,0".parse::<Cell>().is_err());
        assert!("a,b".parse::<Cell>().is_err());
    }

    #[test]
    fn player_to_move() {
        assert_eq!(Board::empty().to_move(), Player::X);
        assert_eq!(board("x........").to_move(), Player::O);
        assert_eq!(board("x...o....").to_move(), Player::X);
        assert_eq!(!Player::X, Player::O);
        assert_eq!(Player::O.role(), 1);
    }

    #[test]
    fn place() {
        let next = Board::empty().place(cell(1, 1));
        assert_eq!(next.at(cell(1, 1)), Some(Player::X));
        assert_eq!(next.to_move(), Player::O);
        let next = next.place(cell(0, 0));
        assert_eq!(next.at(cell(0, 0)), Some(Player::O));
        assert_eq!(next, board("o...x...."));
    }

    #[test]
    fn winners() {
        // Rows, columns and both diagonals count for both players.
        for (cells, winner) in [
            ("xxxoo....", Player::X),
            ("oo.xxx...", Player::X),
            ("x..xo.xo.", Player::X),
            ("x.o.x.o.x", Player::X),
            ("xx.x..ooo", Player::O),
            ("xoxxo..o.", Player::O),
            ("ox.xo.x.o", Player::O),
            ("xxo.o.ox.", Player::O),
        ] {
            assert_eq!(board(cells).winner(), Some(winner), "{cells}");
            assert!(TicTacToe.is_terminal(&board(cells)), "{cells}");
            assert!(TicTacToe.legal_actions(&board(cells)).is_empty(), "{cells}");
        }
        assert_eq!(board("xo.......").winner(), None);
    }

    #[test]
    fn rewards() {
        assert_eq!(TicTacToe.evaluate_terminal(&board("xxxoo....")), [1.0, -1.0]);
        assert_eq!(TicTacToe.evaluate_terminal(&board("xxo.o.ox.")), [-1.0, 1.0]);
        assert_eq!(TicTacToe.evaluate_terminal(&board("xoxxoxoxo")), [0.0, 0.0]);
        assert!(TicTacToe.is_terminal(&board("xoxxoxoxo")));
    }

    #[test]
    fn legal_actions() {
        assert_eq!(TicTacToe.legal_actions(&Board::empty()).len(), 9);
        assert_eq!(TicTacToe.legal_actions(&board("xo.x.o...")), vec![
            cell(2, 0),
            cell(1, 1),
            cell(0, 2),
            cell(1, 2),
            cell(2, 2),
        ]);
        assert_eq!(TicTacToe.active_role(&board("xo.x.o...")), 0);
        assert!(!TicTacToe.is_terminal(&board("xo.x.o...")));
    }
}
