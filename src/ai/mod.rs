//! AI 算法模块：基于 nim 和的最优策略。

pub mod nim_sum;

pub use nim_sum::{decide, next_move, nim_sum, AiDecision};
