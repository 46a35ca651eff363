//! Translation of the `config` crate's AST types into the arbiter's.
use arbiter::{Direction, WaitStrategy};
use config::ast;

pub fn direction(val: ast::Direction) -> Direction {
    match val {
        ast::Direction::Send => Direction::Send,
        ast::Direction::Receive => Direction::Receive,
    }
}

pub fn wait_strategy(val: ast::WaitMode) -> WaitStrategy {
    match val {
        ast::WaitMode::Block => WaitStrategy::Block,
        ast::WaitMode::Yield => WaitStrategy::Yield,
    }
}
