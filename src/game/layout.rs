//! 画布几何：把点击坐标映射为 (堆, 数量)，并给出每枚筹码的绘制矩形。
//!
//! 画布按堆数均分为等宽的列，按最高堆高度均分为等高的行。第 `i` 堆的
//! 第 `j` 枚筹码（`j = 0` 为最底部一枚）占据第 `max_height - j - 1` 行，
//! 四周各留出 `offset` 比例的空隙。点中第 `j` 枚会连同其上方所有筹码一并取走。

use serde::{Deserialize, Serialize};

use super::state::{ChipCount, HeapIndex, Move};

pub const DEFAULT_OFFSET: f64 = 0.05;

/// 画布尺寸与留白比例。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    pub offset: f64,
}

/// 一枚筹码在画布上的矩形，原点在左上角。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ChipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            offset: DEFAULT_OFFSET,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn column_width(&self, heap_count: usize) -> f64 {
        self.width / heap_count as f64
    }

    pub fn row_height(&self, max_height: ChipCount) -> f64 {
        self.height / max_height as f64
    }

    /// 闭区间 `[(cell + offset) * size, 起点 + (1 - 2 * offset) * size]`。
    fn band(&self, cell: f64, size: f64) -> (f64, f64) {
        let start = (cell + self.offset) * size;
        (start, start + (1.0 - 2.0 * self.offset) * size)
    }

    /// 点击横坐标落在哪一堆的可点击区域内；落在间隙或画布外时返回 `None`。
    pub fn find_heap(&self, x: f64, heaps: &[ChipCount]) -> Option<HeapIndex> {
        if heaps.is_empty() {
            return None;
        }
        let dx = self.column_width(heaps.len());
        (0..heaps.len()).find(|&i| {
            let (min_x, max_x) = self.band(i as f64, dx);
            min_x <= x && x <= max_x
        })
    }

    /// 点击纵坐标对应要从 `heap_index` 堆取走的数量。
    pub fn find_amount(
        &self,
        y: f64,
        heap_index: HeapIndex,
        heaps: &[ChipCount],
    ) -> Option<ChipCount> {
        let count = *heaps.get(heap_index)?;
        let max_height = heaps.iter().copied().max().unwrap_or(0);
        if max_height == 0 {
            return None;
        }
        let dy = self.row_height(max_height);
        (0..count)
            .find(|&j| {
                let (min_y, max_y) = self.band((max_height - j - 1) as f64, dy);
                min_y <= y && y <= max_y
            })
            .map(|j| count - j)
    }

    pub fn find_move(&self, x: f64, y: f64, heaps: &[ChipCount]) -> Option<Move> {
        let heap_index = self.find_heap(x, heaps)?;
        let amount = self.find_amount(y, heap_index, heaps)?;
        Some(Move::new(heap_index, amount))
    }

    pub fn chip_rect(
        &self,
        heap_index: HeapIndex,
        row: ChipCount,
        heaps: &[ChipCount],
    ) -> Option<ChipRect> {
        let count = *heaps.get(heap_index)?;
        if row >= count {
            return None;
        }
        let max_height = heaps.iter().copied().max().unwrap_or(0);
        let dx = self.column_width(heaps.len());
        let dy = self.row_height(max_height);
        let (x, _) = self.band(heap_index as f64, dx);
        let (y, _) = self.band((max_height - row - 1) as f64, dy);
        let scale = 1.0 - 2.0 * self.offset;
        Some(ChipRect {
            x,
            y,
            width: scale * dx,
            height: scale * dy,
        })
    }
}
