use pretty_assertions::assert_eq;
use uct::environment::{Environment, Rewards, Role};
use uct::games::tictactoe::{Board, Cell, TicTacToe};
use uct::mcts::{Config, Node, SearchError, Searcher};

fn board(cells: &str) -> Board {
    Board::try_from(cells).expect("we are checking valid boards")
}

fn cell(column: u8, row: u8) -> Cell {
    Cell::new(column, row).expect("valid cell")
}

fn search(cells: &str, config: Config) -> Searcher<TicTacToe, 2> {
    let mut searcher = Searcher::new(TicTacToe, board(cells), config).expect("valid config");
    let _ = searcher.run().expect("tic-tac-toe follows the environment contract");
    searcher
}

fn assert_same_tree<E: Environment<2>>(lhs: &Node<E, 2>, rhs: &Node<E, 2>) {
    assert_eq!(lhs.visit_count(), rhs.visit_count());
    assert_eq!(lhs.total_value(), rhs.total_value());
    assert_eq!(lhs.is_expanded(), rhs.is_expanded());
    assert_eq!(lhs.children().count(), rhs.children().count());
    for ((lhs_action, lhs_child), (rhs_action, rhs_child)) in lhs.children().zip(rhs.children()) {
        assert_eq!(lhs_action, rhs_action);
        assert_same_tree(lhs_child, rhs_child);
    }
}

#[test]
fn empty_board() {
    let searcher = search(".........", Config::default());
    let legal = TicTacToe.legal_actions(&Board::empty());

    assert_eq!(searcher.root().visit_count(), 10_000);
    let best = searcher.best_action().expect("root is expanded");
    assert!(legal.contains(best));
    let recommended = searcher.recommended_action().expect("root is expanded");
    assert!(legal.contains(recommended));
    // Every move has been tried.
    assert!(searcher
        .root()
        .children()
        .all(|(_, child)| child.visit_count() > 0));
}

#[test]
fn forced_win_for_first_player() {
    let searcher = search("xx.oo....", Config::default());
    let root = searcher.root();
    let winning = cell(2, 0);
    let value = root.child_value(&winning).expect("legal move");
    assert_eq!(value, 1.0);
    for (action, _) in root.children().filter(|(action, _)| **action != winning) {
        let sibling = root.child_value(action).expect("legal move");
        assert!(value > sibling, "{action} has value {sibling}");
    }
    assert_eq!(searcher.recommended_action(), Ok(&winning));
}

#[test]
fn forced_win_for_second_player() {
    let searcher = search("xx.oo.x..", Config::default().with_seed(3));
    let root = searcher.root();
    assert_eq!(root.active_role(), 1);
    let winning = cell(2, 1);
    let value = root.child_value(&winning).expect("legal move");
    assert_eq!(value, 1.0);
    for (action, _) in root.children().filter(|(action, _)| **action != winning) {
        assert!(value > root.child_value(action).expect("legal move"));
    }
    assert_eq!(searcher.recommended_action(), Ok(&winning));
}

#[test]
fn blocks_immediate_loss() {
    // O threatens to complete the middle row, X has no immediate win.
    let searcher = search("x...oo.x.", Config::default().with_seed(5));
    assert_eq!(searcher.recommended_action(), Ok(&cell(0, 1)));
}

#[test]
fn deterministic() {
    for seed in [0, 1, 42] {
        let config = Config::default().with_iterations(2000).with_seed(seed);
        let first = search("x........", config.clone());
        let second = search("x........", config);
        assert_same_tree(first.root(), second.root());
    }
}

#[test]
fn terminal_root() {
    let mut searcher =
        Searcher::new(TicTacToe, board("xoxxoxoxo"), Config::default()).expect("valid config");
    assert_eq!(searcher.search_once(), Ok([0.0, 0.0]));
    assert!(!searcher.root().is_expanded());
    assert_eq!(searcher.root().visit_count(), 1);
    assert_eq!(searcher.root().terminal_rewards(), Some(&[0.0, 0.0]));
}

#[test]
fn tree_hand_off() {
    let searcher = search("x...o....", Config::default().with_iterations(100));
    let root = searcher.into_root();
    assert_eq!(root.visit_count(), 100);
    assert_eq!(*root.state(), board("x...o...."));
}

/// Three players take turns adding 1 or 2 to a counter, the one to reach the
/// goal wins.
struct Race {
    goal: u8,
}

#[derive(Debug)]
struct Counter {
    value: u8,
    to_move: Role,
}

impl Environment<3> for Race {
    type State = Counter;
    type Action = u8;

    fn is_terminal(&self, counter: &Counter) -> bool {
        counter.value >= self.goal
    }

    fn evaluate_terminal(&self, counter: &Counter) -> Rewards<3> {
        let mut rewards = [0.0; 3];
        rewards[(counter.to_move + 2) % 3] = 1.0;
        rewards
    }

    fn active_role(&self, counter: &Counter) -> Role {
        counter.to_move
    }

    fn legal_actions(&self, _: &Counter) -> Vec<u8> {
        vec![1, 2]
    }

    fn apply(&self, counter: &Counter, step: &u8) -> Counter {
        Counter {
            value: counter.value + step,
            to_move: (counter.to_move + 1) % 3,
        }
    }

    fn describe_state(&self, counter: &Counter) -> String {
        format!("{counter:?}")
    }
}

#[test]
fn three_roles() {
    let config = Config::default().with_iterations(3000).with_seed(9);
    let mut searcher = Searcher::new(Race { goal: 7 }, Counter {
        value: 0,
        to_move: 0,
    }, config)
    .expect("valid config");
    let stats = searcher.run().expect("valid environment");
    assert_eq!(stats.iterations, 3000);

    // Exactly one role wins every game.
    let root = searcher.root();
    assert_eq!(root.total_value().iter().sum::<f64>(), 3000.0);

    // From 5 the player to move reaches the goal immediately by adding 2.
    let mut searcher = Searcher::new(Race { goal: 7 }, Counter {
        value: 5,
        to_move: 1,
    }, Config::default().with_iterations(100))
    .expect("valid config");
    let _ = searcher.run().expect("valid environment");
    assert_eq!(searcher.recommended_action(), Ok(&2));
    assert_eq!(
        searcher.root().child(&2).and_then(|child| child.terminal_rewards().copied()),
        Some([0.0, 1.0, 0.0])
    );
}

/// Claims that the game goes on but offers no moves.
struct Stuck;

impl Environment<2> for Stuck {
    type State = ();
    type Action = ();

    fn is_terminal(&self, _: &()) -> bool {
        false
    }

    fn evaluate_terminal(&self, _: &()) -> Rewards<2> {
        [0.0; 2]
    }

    fn active_role(&self, _: &()) -> Role {
        0
    }

    fn legal_actions(&self, _: &()) -> Vec<()> {
        Vec::new()
    }

    fn apply(&self, _: &(), _: &()) {}

    fn describe_state(&self, _: &()) -> String {
        String::new()
    }
}

#[test]
fn contract_violation() {
    let mut searcher = Searcher::new(Stuck, (), Config::default()).expect("valid config");
    assert_eq!(searcher.search_once(), Err(SearchError::NoLegalActions));
    assert_eq!(searcher.run().err(), Some(SearchError::NoLegalActions));
}
