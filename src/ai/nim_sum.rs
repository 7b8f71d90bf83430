use serde::{Deserialize, Serialize};

use crate::game::{ChipCount, HeapIndex, Move};

/// AI 的一次决策，附带计算依据。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    #[serde(rename = "move")]
    pub mv: Move,
    /// 决策前局面的 nim 和。
    pub nim_sum: ChipCount,
    /// 为真表示本步之后对手面对 nim 和为 0 的必败局面。
    pub winning: bool,
}

/// 所有堆大小的按位异或。
pub fn nim_sum(heaps: &[ChipCount]) -> ChipCount {
    heaps.iter().fold(0, |acc, &count| acc ^ count)
}

/// 堆下标按大小降序排列，同样大小时下标小的在前。
fn by_size_desc(heaps: &[ChipCount]) -> Vec<HeapIndex> {
    let mut order: Vec<HeapIndex> = (0..heaps.len()).filter(|&i| heaps[i] > 0).collect();
    order.sort_by(|&a, &b| heaps[b].cmp(&heaps[a]));
    order
}

/// 计算最优走法。
///
/// nim 和不为 0 时，从大到小找第一个满足 `h ^ s < h` 的堆，把它取到
/// `h ^ s`，使剩余局面的 nim 和归零。nim 和为 0 时不存在必胜走法，
/// 从最大的堆取 1 枚维持对局。没有可取的堆时返回 `None`。
pub fn decide(heaps: &[ChipCount]) -> Option<AiDecision> {
    let order = by_size_desc(heaps);
    let largest = *order.first()?;
    let sum = nim_sum(heaps);

    if sum != 0 {
        let target = order.iter().copied().find_map(|index| {
            let count = heaps[index];
            let target = count ^ sum;
            (target < count).then(|| Move::new(index, count - target))
        });
        if let Some(mv) = target {
            return Some(AiDecision {
                mv,
                nim_sum: sum,
                winning: true,
            });
        }
    }

    Some(AiDecision {
        mv: Move::new(largest, 1),
        nim_sum: sum,
        winning: false,
    })
}

pub fn next_move(heaps: &[ChipCount]) -> Option<Move> {
    decide(heaps).map(|decision| decision.mv)
}
