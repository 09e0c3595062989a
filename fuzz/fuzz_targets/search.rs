#![no_main]
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;
use uct::environment::Environment;
use uct::games::tictactoe::{Board, TicTacToe};
use uct::mcts::{Config, Searcher};

// The first byte picks the seed, the second one the number of iterations and
// the rest select moves from the empty board.
fuzz_target!(|data: &[u8]| {
    let [seed, iterations, moves @ ..] = data else {
        return;
    };
    let mut board = Board::empty();
    for &choice in moves {
        let actions = TicTacToe.legal_actions(&board);
        if actions.is_empty() {
            break;
        }
        board = TicTacToe.apply(&board, &actions[usize::from(choice) % actions.len()]);
    }
    let iterations = u64::from(*iterations) + 1;
    let config = Config::default()
        .with_iterations(iterations)
        .with_seed(u64::from(*seed));
    let mut searcher = Searcher::new(TicTacToe, board, config).unwrap();
    let stats = searcher.run().unwrap();
    assert_eq!(stats.iterations, iterations);

    let root = searcher.root();
    assert_eq!(root.visit_count(), iterations);
    if TicTacToe.is_terminal(&board) {
        assert!(!root.is_expanded());
        return;
    }
    assert_eq!(
        root.children().map(|(_, child)| child.visit_count()).sum::<u64>(),
        iterations
    );
    let legal = TicTacToe.legal_actions(&board);
    assert!(legal.contains(searcher.recommended_action().unwrap()));
});
