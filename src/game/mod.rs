//! 游戏核心逻辑模块（堆状态、点击几何、回合状态机）。

pub mod config;
pub mod layout;
pub mod rules;
pub mod state;

pub use config::GameConfig;
pub use layout::{ChipRect, Layout, DEFAULT_OFFSET};
pub use rules::{GameController, GamePhase, GameRecord, MoveError, TurnResolution};
pub use state::{
    ChipCount,
    GameEvent,
    HeapIndex,
    HeapSnapshot,
    HeapState,
    IntegrityError,
    Move,
    Outcome,
    Player,
};
