use serde::{Deserialize, Serialize};

use super::layout::DEFAULT_OFFSET;
use super::state::ChipCount;

const DEFAULT_HEAP_COUNT: u32 = 3;
const DEFAULT_HEAP_COUNT_BOUNDS: (u32, u32) = (3, 7);
const DEFAULT_SIZE_RANGE: (ChipCount, ChipCount) = (5, 15);
const DEFAULT_SURFACE_WIDTH: f64 = 800.0;
const DEFAULT_SURFACE_HEIGHT: f64 = 600.0;
const MAX_OFFSET: f64 = 0.5;

/// 对局配置。前端可传入 JSON，缺省字段使用默认值。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub heap_count: u32,
    pub heap_count_bounds: (u32, u32),
    /// 每堆初始数量的闭区间。
    pub size_range: (ChipCount, ChipCount),
    /// 新局面中至少出现的不同堆大小个数，1 表示不限制。
    pub min_distinct_sizes: usize,
    /// 每个格子四周留白占格子宽高的比例，取值 (0, 0.5)。
    pub offset: f64,
    pub surface_width: f64,
    pub surface_height: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn with_heap_count(mut self, heap_count: u32) -> Self {
        self.heap_count = heap_count;
        self
    }

    pub fn with_heap_count_bounds(mut self, min: u32, max: u32) -> Self {
        self.heap_count_bounds = (min, max);
        self
    }

    pub fn with_size_range(mut self, min: ChipCount, max: ChipCount) -> Self {
        self.size_range = (min, max);
        self
    }

    pub fn with_min_distinct_sizes(mut self, count: usize) -> Self {
        self.min_distinct_sizes = count;
        self
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_surface(mut self, width: f64, height: f64) -> Self {
        self.surface_width = width;
        self.surface_height = height;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn clamp_heap_count(&self, heap_count: u32) -> u32 {
        let (min, max) = self.heap_count_bounds;
        heap_count.clamp(min, max)
    }

    /// 修正越界或颠倒的取值，使配置总能生成合法局面。
    pub fn validated(mut self) -> Self {
        let (low, high) = self.heap_count_bounds;
        let low = low.max(1);
        self.heap_count_bounds = (low.min(high.max(1)), high.max(low));
        self.heap_count = self.clamp_heap_count(self.heap_count);

        let (min, max) = self.size_range;
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.size_range = (min.max(1), max.max(1));

        if !self.offset.is_finite() || self.offset <= 0.0 || self.offset >= MAX_OFFSET {
            self.offset = DEFAULT_OFFSET;
        }
        if !self.surface_width.is_finite() || self.surface_width < 0.0 {
            self.surface_width = DEFAULT_SURFACE_WIDTH;
        }
        if !self.surface_height.is_finite() || self.surface_height < 0.0 {
            self.surface_height = DEFAULT_SURFACE_HEIGHT;
        }
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            heap_count: DEFAULT_HEAP_COUNT,
            heap_count_bounds: DEFAULT_HEAP_COUNT_BOUNDS,
            size_range: DEFAULT_SIZE_RANGE,
            min_distinct_sizes: 1,
            offset: DEFAULT_OFFSET,
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
            seed: None,
        }
    }
}
