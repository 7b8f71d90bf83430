use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use rand::Rng;

use super::config::GameConfig;
use super::rules::MoveError;

/// 单堆筹码数量。
pub type ChipCount = u32;
/// 堆在当前序列中的位置；移除空堆后会前移，不是稳定标识。
pub type HeapIndex = usize;

/// 行动方。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Human,
    Agent,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Human => Player::Agent,
            Player::Agent => Player::Human,
        }
    }
}

/// 对局结果：拿走最后一枚筹码的一方获胜。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    PlayerWon,
    AgentWon,
}

impl Outcome {
    pub fn for_last_mover(player: Player) -> Self {
        match player {
            Player::Human => Outcome::PlayerWon,
            Player::Agent => Outcome::AgentWon,
        }
    }

    pub fn winner(self) -> Player {
        match self {
            Outcome::PlayerWon => Player::Human,
            Outcome::AgentWon => Player::Agent,
        }
    }
}

/// 一次取子操作，由点击检测或 AI 产生，随即交给控制器执行。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Move {
    pub heap_index: HeapIndex,
    pub amount: ChipCount,
}

impl Move {
    pub fn new(heap_index: HeapIndex, amount: ChipCount) -> Self {
        Self { heap_index, amount }
    }
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    GameStarted {
        heaps: Vec<ChipCount>,
    },
    ChipsRemoved {
        by: Player,
        heap_index: HeapIndex,
        amount: ChipCount,
        /// 该堆被取空并移除，后续下标整体前移。
        heap_cleared: bool,
    },
    GameOver {
        outcome: Outcome,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    EmptyHeap { heap_index: HeapIndex },
}

/// 有序的堆序列。序列中每个值都大于 0：某堆取空时立即删除，
/// 其后的堆下标减一。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct HeapState {
    heaps: Vec<ChipCount>,
}

impl HeapState {
    /// 构造堆序列，过滤掉数量为 0 的堆。
    pub fn new(heaps: Vec<ChipCount>) -> Self {
        Self {
            heaps: heaps.into_iter().filter(|&count| count > 0).collect(),
        }
    }

    /// 按配置随机生成新局面。每堆在闭区间内均匀取值，
    /// 不同数值个数不足 `min_distinct_sizes` 时重新抽取。
    pub fn generate<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let config = config.clone().validated();
        let (min, max) = config.size_range;
        let heap_count = config.heap_count as usize;
        let span = (max - min + 1) as usize;
        let required = config.min_distinct_sizes.min(heap_count).min(span);

        loop {
            let heaps: Vec<ChipCount> = (0..heap_count)
                .map(|_| rng.gen_range(min..=max))
                .collect();
            let distinct = heaps.iter().collect::<HashSet<_>>().len();
            if distinct >= required {
                return Self::new(heaps);
            }
        }
    }

    pub fn heaps(&self) -> &[ChipCount] {
        &self.heaps
    }

    pub fn len(&self) -> usize {
        self.heaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heaps.is_empty()
    }

    pub fn get(&self, index: HeapIndex) -> Option<ChipCount> {
        self.heaps.get(index).copied()
    }

    /// 没有剩余的堆时为真，此时轮到的一方已无子可取。
    pub fn is_terminal(&self) -> bool {
        self.heaps.is_empty()
    }

    /// 最高堆的高度，仅用于布局；空局面返回 0。
    pub fn max_height(&self) -> ChipCount {
        self.heaps.iter().copied().max().unwrap_or(0)
    }

    /// 从第 `index` 堆取走 `amount` 枚，取空则删除该堆并返回 `true`。
    /// 任何校验失败都不修改状态。
    pub fn try_remove(&mut self, index: HeapIndex, amount: ChipCount) -> Result<bool, MoveError> {
        let len = self.heaps.len();
        let available = *self
            .heaps
            .get(index)
            .ok_or(MoveError::HeapOutOfRange { heap_index: index, len })?;
        if amount == 0 {
            return Err(MoveError::ZeroAmount);
        }
        if amount > available {
            return Err(MoveError::AmountExceedsHeap {
                heap_index: index,
                amount,
                available,
            });
        }

        let remaining = available - amount;
        if remaining == 0 {
            self.heaps.remove(index);
            Ok(true)
        } else {
            self.heaps[index] = remaining;
            Ok(false)
        }
    }

    /// [`HeapState::try_remove`] 的布尔版本。
    pub fn remove(&mut self, index: HeapIndex, amount: ChipCount) -> bool {
        self.try_remove(index, amount).is_ok()
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        match self.heaps.iter().position(|&count| count == 0) {
            Some(heap_index) => Err(IntegrityError::EmptyHeap { heap_index }),
            None => Ok(()),
        }
    }
}

/// 重绘所需的快照：堆序列与当前行动方。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeapSnapshot {
    pub heaps: Vec<ChipCount>,
    pub is_over: bool,
    pub is_player_turn: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub max_height: ChipCount,
}
