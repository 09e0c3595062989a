//! Ready-made [`crate::environment::Environment`] implementations.

pub mod tictactoe;
