#![no_main]
use libfuzzer_sys::fuzz_target;
use pretty_assertions::assert_eq;
use uct::games::tictactoe::Board;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(board) = Board::try_from(input) {
            let printed = board.to_string();
            assert_eq!(Board::try_from(printed.as_str()).ok(), Some(board));
        }
    }
});
