use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::ai;

use super::{
    config::GameConfig,
    layout::Layout,
    state::{ChipCount, GameEvent, HeapIndex, HeapSnapshot, HeapState, Move, Outcome, Player},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum MoveError {
    #[error("game is already finished")]
    GameFinished,
    #[error("it is not the player's turn")]
    NotPlayerTurn,
    #[error("no heap under x = {x}")]
    NoHeapAt { x: String },
    #[error("no chip of heap {heap_index} under y = {y}")]
    NoChipAt { heap_index: HeapIndex, y: String },
    #[error("heap {heap_index} out of range, {len} heaps remain")]
    HeapOutOfRange { heap_index: HeapIndex, len: usize },
    #[error("must remove at least one chip")]
    ZeroAmount,
    #[error("cannot remove {amount} from heap {heap_index} holding {available}")]
    AmountExceedsHeap {
        heap_index: HeapIndex,
        amount: ChipCount,
        available: ChipCount,
    },
}

/// 回合状态机。`AgentTurn` 只在一次同步处理中短暂出现。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    PlayerTurn,
    AgentTurn,
    GameOver,
}

impl Default for GamePhase {
    fn default() -> Self {
        Self::PlayerTurn
    }
}

/// 一个完整逻辑回合（玩家一步加上随后的 AI 一步）的结果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResolution {
    pub snapshot: HeapSnapshot,
    pub events: Vec<GameEvent>,
}

/// 可序列化的对局记录，供调试或前端持久化界面使用。
#[derive(Debug, Clone, Serialize)]
pub struct GameRecord<'a> {
    pub config: &'a GameConfig,
    pub heaps: &'a HeapState,
    pub phase: GamePhase,
    pub player_turn: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub layout: Layout,
    pub event_log: &'a [GameEvent],
}

type RedrawListener = Box<dyn FnMut(&HeapSnapshot)>;

fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// 对局控制器：独占堆状态与回合标志，每次状态变化后通知重绘。
pub struct GameController {
    config: GameConfig,
    heaps: HeapState,
    player_turn: bool,
    phase: GamePhase,
    outcome: Option<Outcome>,
    layout: Layout,
    event_log: Vec<GameEvent>,
    rng: SmallRng,
    listeners: Vec<RedrawListener>,
}

impl GameController {
    pub fn new(config: GameConfig) -> Self {
        let config = config.validated();
        let mut rng = seeded_rng(config.seed);
        let heaps = HeapState::generate(&config, &mut rng);
        Self::from_parts(config, heaps, rng)
    }

    /// `size_range` 为闭区间。
    pub fn new_game(heap_count: u32, size_range: (ChipCount, ChipCount)) -> Self {
        Self::new(
            GameConfig::default()
                .with_heap_count(heap_count)
                .with_size_range(size_range.0, size_range.1),
        )
    }

    /// 从指定局面开始，主要用于测试与复盘。
    pub fn with_heaps(config: GameConfig, heaps: Vec<ChipCount>) -> Self {
        let config = config.validated();
        let rng = seeded_rng(config.seed);
        Self::from_parts(config, HeapState::new(heaps), rng)
    }

    fn from_parts(config: GameConfig, heaps: HeapState, rng: SmallRng) -> Self {
        let layout = Layout::new(config.surface_width, config.surface_height)
            .with_offset(config.offset);
        let mut controller = Self {
            config,
            heaps,
            player_turn: true,
            phase: GamePhase::PlayerTurn,
            outcome: None,
            layout,
            event_log: Vec::new(),
            rng,
            listeners: Vec::new(),
        };
        controller.record_start();
        controller
    }

    fn record_start(&mut self) {
        info!(heaps = ?self.heaps.heaps(), "new nim game");
        self.event_log.push(GameEvent::GameStarted {
            heaps: self.heaps.heaps().to_vec(),
        });
        if self.heaps.is_terminal() {
            // 空局面开局：先手无子可取，判 AI 胜
            self.finish(Player::Agent);
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn heaps(&self) -> &HeapState {
        &self.heaps
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_player_turn(&self) -> bool {
        self.player_turn
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn heap_count(&self) -> u32 {
        self.config.heap_count
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.event_log
    }

    pub fn snapshot(&self) -> HeapSnapshot {
        HeapSnapshot {
            heaps: self.heaps.heaps().to_vec(),
            is_over: self.is_over(),
            is_player_turn: self.player_turn,
            outcome: self.outcome,
            max_height: self.heaps.max_height(),
        }
    }

    pub fn record(&self) -> GameRecord<'_> {
        GameRecord {
            config: &self.config,
            heaps: &self.heaps,
            phase: self.phase,
            player_turn: self.player_turn,
            outcome: self.outcome,
            layout: self.layout,
            event_log: &self.event_log,
        }
    }

    /// 注册重绘回调，每次状态变化和重开局后都会被调用。
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&HeapSnapshot) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    fn request_redraw(&mut self) {
        let snapshot = self.snapshot();
        for listener in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }

    /// 处理一次点击。无法解析、越界或不在玩家回合的点击都被静默忽略。
    pub fn on_click(&mut self, x: f64, y: f64) -> bool {
        match self.apply_click(x, y) {
            Ok(_) => true,
            Err(reason) => {
                debug!(x, y, %reason, "click ignored");
                false
            }
        }
    }

    pub fn apply_click(&mut self, x: f64, y: f64) -> Result<TurnResolution, MoveError> {
        self.ensure_player_turn()?;
        let heaps = self.heaps.heaps();
        let heap_index = self
            .layout
            .find_heap(x, heaps)
            .ok_or_else(|| MoveError::NoHeapAt { x: x.to_string() })?;
        let amount = self
            .layout
            .find_amount(y, heap_index, heaps)
            .ok_or_else(|| MoveError::NoChipAt {
                heap_index,
                y: y.to_string(),
            })?;
        self.try_player_move(Move::new(heap_index, amount))
    }

    fn ensure_player_turn(&self) -> Result<(), MoveError> {
        match self.phase {
            GamePhase::GameOver => Err(MoveError::GameFinished),
            GamePhase::AgentTurn => Err(MoveError::NotPlayerTurn),
            GamePhase::PlayerTurn => Ok(()),
        }
    }

    /// 执行玩家走法；成功且未终局时立即同步执行 AI 的回应。
    pub fn try_player_move(&mut self, mv: Move) -> Result<TurnResolution, MoveError> {
        self.ensure_player_turn()?;
        let mut events = Vec::new();
        self.apply_move(Player::Human, mv, &mut events)?;

        if !self.is_over() {
            self.phase = GamePhase::AgentTurn;
        }
        self.request_redraw();

        if self.phase == GamePhase::AgentTurn {
            self.agent_step(&mut events);
        }

        Ok(TurnResolution {
            snapshot: self.snapshot(),
            events,
        })
    }

    fn agent_step(&mut self, events: &mut Vec<GameEvent>) {
        let Some(decision) = ai::decide(self.heaps.heaps()) else {
            error!(heaps = ?self.heaps.heaps(), "agent found no move on a live board");
            self.phase = GamePhase::PlayerTurn;
            return;
        };
        debug!(
            heap_index = decision.mv.heap_index,
            amount = decision.mv.amount,
            nim_sum = decision.nim_sum,
            winning = decision.winning,
            "agent move"
        );

        if let Err(reason) = self.apply_move(Player::Agent, decision.mv, events) {
            error!(%reason, "agent produced an illegal move");
            self.phase = GamePhase::PlayerTurn;
            return;
        }
        if !self.is_over() {
            self.phase = GamePhase::PlayerTurn;
        }
        self.request_redraw();
    }

    fn apply_move(
        &mut self,
        by: Player,
        mv: Move,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), MoveError> {
        let heap_cleared = self.heaps.try_remove(mv.heap_index, mv.amount)?;
        let event = GameEvent::ChipsRemoved {
            by,
            heap_index: mv.heap_index,
            amount: mv.amount,
            heap_cleared,
        };
        self.event_log.push(event.clone());
        events.push(event);

        self.player_turn = !self.player_turn;
        if self.heaps.is_terminal() {
            if let Some(event) = self.finish(by) {
                events.push(event);
            }
        }
        Ok(())
    }

    fn finish(&mut self, last_mover: Player) -> Option<GameEvent> {
        if self.outcome.is_some() {
            return None;
        }
        let outcome = Outcome::for_last_mover(last_mover);
        info!(?outcome, "nim game over");
        self.phase = GamePhase::GameOver;
        self.outcome = Some(outcome);
        let event = GameEvent::GameOver { outcome };
        self.event_log.push(event.clone());
        Some(event)
    }

    /// 以当前堆数重开一局。
    pub fn on_reset(&mut self) {
        self.heaps = HeapState::generate(&self.config, &mut self.rng);
        self.player_turn = true;
        self.phase = GamePhase::PlayerTurn;
        self.outcome = None;
        self.event_log.clear();
        self.record_start();
        self.request_redraw();
    }

    /// 堆数加减 1（限制在配置范围内）并重开；已到边界时不做任何事。
    pub fn on_heap_count_change(&mut self, delta: i32) -> bool {
        let current = self.config.heap_count as i64;
        let requested = (current + delta as i64).max(0);
        let next = self
            .config
            .clamp_heap_count(requested.min(u32::MAX as i64) as u32);
        if next == self.config.heap_count {
            debug!(delta, heap_count = next, "heap count unchanged");
            return false;
        }
        self.config.heap_count = next;
        self.on_reset();
        true
    }

    /// 直接指定堆数（限制在配置范围内）并重开。
    pub fn set_heap_count(&mut self, heap_count: u32) -> u32 {
        self.config.heap_count = self.config.clamp_heap_count(heap_count);
        self.on_reset();
        self.config.heap_count
    }

    /// 画布尺寸变化。非有限值或负值被忽略。
    pub fn on_resize(&mut self, width: f64, height: f64) -> bool {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(width) || !valid(height) {
            debug!(width, height, "resize ignored");
            return false;
        }
        self.layout.width = width;
        self.layout.height = height;
        self.config.surface_width = width;
        self.config.surface_height = height;
        self.request_redraw();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn seeded() -> GameConfig {
        GameConfig::default().with_seed(11).with_surface(300.0, 100.0)
    }

    fn watch(controller: &mut GameController) -> Rc<RefCell<Vec<HeapSnapshot>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        controller.subscribe(move |snapshot| sink.borrow_mut().push(snapshot.clone()));
        seen
    }

    #[test]
    fn new_game_draws_heaps_in_range() {
        let controller = GameController::new_game(5, (5, 15));
        assert_eq!(controller.heaps().len(), 5);
        assert!(controller
            .heaps()
            .heaps()
            .iter()
            .all(|h| (5..=15).contains(h)));
        assert_eq!(controller.phase(), GamePhase::PlayerTurn);
        assert!(controller.is_player_turn());
    }

    #[test]
    fn click_in_gap_changes_nothing() {
        let mut controller = GameController::with_heaps(seeded(), vec![3, 4, 5]);
        let seen = watch(&mut controller);

        assert!(!controller.on_click(100.0, 90.0));
        assert_eq!(controller.heaps().heaps(), &[3, 4, 5]);
        assert_eq!(controller.phase(), GamePhase::PlayerTurn);
        assert!(controller.is_player_turn());
        assert!(seen.borrow().is_empty(), "ignored click should not redraw");
        assert!(matches!(
            controller.apply_click(100.0, 90.0),
            Err(MoveError::NoHeapAt { .. })
        ));
    }

    #[test]
    fn accepted_click_triggers_agent_reply() {
        // 点中第 1 堆最底部一枚，取走全部 4 枚，剩 [3, 5]；AI 取到 [3, 3]
        let mut controller = GameController::with_heaps(seeded(), vec![3, 4, 5]);
        let seen = watch(&mut controller);

        let resolution = controller.apply_click(150.0, 90.0).expect("valid click");
        assert_eq!(controller.heaps().heaps(), &[3, 3]);
        assert_eq!(controller.phase(), GamePhase::PlayerTurn);
        assert!(controller.is_player_turn());
        assert_eq!(
            resolution.events,
            vec![
                GameEvent::ChipsRemoved {
                    by: Player::Human,
                    heap_index: 1,
                    amount: 4,
                    heap_cleared: true
                },
                GameEvent::ChipsRemoved {
                    by: Player::Agent,
                    heap_index: 1,
                    amount: 2,
                    heap_cleared: false
                },
            ]
        );

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2, "one redraw per applied move");
        assert_eq!(seen[0].heaps, vec![3, 5]);
        assert!(!seen[0].is_player_turn);
        assert_eq!(seen[1].heaps, vec![3, 3]);
        assert!(seen[1].is_player_turn);
    }

    #[test]
    fn player_taking_last_chip_wins() {
        let mut controller = GameController::with_heaps(seeded(), vec![2]);
        let resolution = controller
            .try_player_move(Move::new(0, 2))
            .expect("legal move");
        assert!(controller.is_over());
        assert_eq!(controller.outcome(), Some(Outcome::PlayerWon));
        assert!(!controller.is_player_turn());
        assert_eq!(
            resolution.events.last(),
            Some(&GameEvent::GameOver {
                outcome: Outcome::PlayerWon
            })
        );
    }

    #[test]
    fn agent_taking_last_chip_wins() {
        let mut controller = GameController::with_heaps(seeded(), vec![1, 3]);
        controller
            .try_player_move(Move::new(0, 1))
            .expect("legal move");
        assert!(controller.heaps().is_terminal());
        assert_eq!(controller.phase(), GamePhase::GameOver);
        assert_eq!(controller.outcome(), Some(Outcome::AgentWon));
        assert!(controller.is_player_turn());
    }

    #[test]
    fn finished_game_rejects_moves() {
        let mut controller = GameController::with_heaps(seeded(), vec![1]);
        controller
            .try_player_move(Move::new(0, 1))
            .expect("legal move");
        assert_eq!(
            controller.try_player_move(Move::new(0, 1)).unwrap_err(),
            MoveError::GameFinished
        );
        assert!(!controller.on_click(150.0, 50.0));
    }

    #[test]
    fn illegal_move_keeps_turn() {
        let mut controller = GameController::with_heaps(seeded(), vec![5]);
        let seen = watch(&mut controller);
        assert_eq!(
            controller.try_player_move(Move::new(0, 10)).unwrap_err(),
            MoveError::AmountExceedsHeap {
                heap_index: 0,
                amount: 10,
                available: 5
            }
        );
        assert_eq!(controller.heaps().heaps(), &[5]);
        assert!(controller.is_player_turn());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn reset_keeps_heap_count_and_redraws() {
        let mut controller = GameController::new(seeded().with_heap_count(4));
        controller
            .try_player_move(Move::new(0, 1))
            .expect("legal move");
        let seen = watch(&mut controller);

        controller.on_reset();
        assert_eq!(controller.heaps().len(), 4);
        assert_eq!(controller.phase(), GamePhase::PlayerTurn);
        assert!(controller.outcome().is_none());
        assert_eq!(controller.events().len(), 1);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn heap_count_change_is_clamped() {
        let mut controller = GameController::new(seeded().with_heap_count(3));
        assert!(!controller.on_heap_count_change(-1));
        assert_eq!(controller.heap_count(), 3);

        assert!(controller.on_heap_count_change(1));
        assert_eq!(controller.heap_count(), 4);
        assert_eq!(controller.heaps().len(), 4);

        assert_eq!(controller.set_heap_count(42), 7);
        assert_eq!(controller.heaps().len(), 7);
        assert!(!controller.on_heap_count_change(1));
    }

    #[test]
    fn resize_updates_layout() {
        let mut controller = GameController::with_heaps(seeded(), vec![3, 4, 5]);
        let seen = watch(&mut controller);
        assert!(controller.on_resize(600.0, 200.0));
        assert_eq!(controller.layout().width, 600.0);
        assert!(!controller.on_resize(f64::NAN, 200.0));
        assert_eq!(seen.borrow().len(), 1);

        // 同一点击在新尺寸下落在第 0 堆
        assert!(controller.on_click(150.0, 180.0));
    }

    #[test]
    fn record_serializes_to_json() {
        let controller = GameController::with_heaps(seeded(), vec![3, 4, 5]);
        let json = serde_json::to_value(controller.record()).expect("record json");
        assert_eq!(json["heaps"], serde_json::json!([3, 4, 5]));
        assert_eq!(json["phase"], "PlayerTurn");
        assert_eq!(json["event_log"][0]["type"], "GameStarted");
    }
}
