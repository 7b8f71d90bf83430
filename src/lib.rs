pub mod ai;
pub mod game;
pub mod utils;

use serde_wasm_bindgen::{from_value, to_value};
use tracing::warn;
use wasm_bindgen::prelude::*;
use web_sys::js_sys::Function;

pub use ai::{decide, next_move, nim_sum, AiDecision};
pub use game::{
    ChipCount, ChipRect, GameConfig, GameController, GameEvent, GamePhase, GameRecord, HeapIndex,
    HeapSnapshot, HeapState, IntegrityError, Layout, Move, MoveError, Outcome, Player,
    TurnResolution, DEFAULT_OFFSET,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
    utils::init_logging();
}

fn to_js_error<E: serde::Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// 前端持有的对局句柄。渲染层只需订阅重绘回调并转发点击、缩放和按键。
#[wasm_bindgen]
pub struct NimGame {
    controller: GameController,
}

#[wasm_bindgen]
impl NimGame {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<NimGame, JsValue> {
        let config = match config_json {
            Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error)?,
            None => GameConfig::default(),
        };
        Ok(NimGame {
            controller: GameController::new(config),
        })
    }

    /// 回调签名为 `(heaps, isOver, isPlayerTurn)`。
    pub fn subscribe(&mut self, callback: Function) {
        self.controller.subscribe(move |snapshot: &HeapSnapshot| {
            let heaps = match to_value(&snapshot.heaps) {
                Ok(heaps) => heaps,
                Err(error) => {
                    warn!(%error, "failed to encode heaps for redraw");
                    return;
                }
            };
            if let Err(error) = callback.call3(
                &JsValue::NULL,
                &heaps,
                &JsValue::from_bool(snapshot.is_over),
                &JsValue::from_bool(snapshot.is_player_turn),
            ) {
                warn!(?error, "redraw callback threw");
            }
        });
    }

    #[wasm_bindgen(js_name = "onClick")]
    pub fn on_click(&mut self, x: f64, y: f64) -> bool {
        self.controller.on_click(x, y)
    }

    /// 不经过点击几何直接走子，返回本回合的 `TurnResolution`。
    #[wasm_bindgen(js_name = "playMove")]
    pub fn play_move(&mut self, heap_index: usize, amount: u32) -> Result<JsValue, JsValue> {
        let resolution = self
            .controller
            .try_player_move(Move::new(heap_index, amount))
            .map_err(to_js_error)?;
        to_value(&resolution).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = "onReset")]
    pub fn on_reset(&mut self) {
        self.controller.on_reset();
    }

    #[wasm_bindgen(js_name = "onResize")]
    pub fn on_resize(&mut self, width: f64, height: f64) -> bool {
        self.controller.on_resize(width, height)
    }

    #[wasm_bindgen(js_name = "onHeapCountChange")]
    pub fn on_heap_count_change(&mut self, delta: i32) -> bool {
        self.controller.on_heap_count_change(delta)
    }

    #[wasm_bindgen(js_name = "setHeapCount")]
    pub fn set_heap_count(&mut self, heap_count: u32) -> u32 {
        self.controller.set_heap_count(heap_count)
    }

    #[wasm_bindgen(getter, js_name = "heapCount")]
    pub fn heap_count(&self) -> u32 {
        self.controller.heap_count()
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.controller.snapshot()).map_err(JsValue::from)
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.controller.record()).map_err(serde_to_js_error)
    }

    /// 第 `heap_index` 堆自底向上第 `row` 枚筹码的 `[x, y, width, height]`。
    #[wasm_bindgen(js_name = "chipRect")]
    pub fn chip_rect(&self, heap_index: usize, row: u32) -> Option<Vec<f64>> {
        self.controller
            .layout()
            .chip_rect(heap_index, row, self.controller.heaps().heaps())
            .map(|rect| vec![rect.x, rect.y, rect.width, rect.height])
    }
}

#[wasm_bindgen(js_name = "nimSum")]
pub fn nim_sum_js(heaps: Vec<u32>) -> u32 {
    nim_sum(&heaps)
}

/// 返回 `{ heap_index, amount }`，没有可取的堆时返回 `undefined`。
#[wasm_bindgen(js_name = "nextMove")]
pub fn next_move_js(heaps: Vec<u32>) -> Result<JsValue, JsValue> {
    to_value(&next_move(&heaps)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(heaps: Vec<u32>) -> Result<JsValue, JsValue> {
    to_value(&decide(&heaps)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "findHeap")]
pub fn find_heap(x: f64, width: f64, height: f64, heaps: Vec<u32>) -> Option<u32> {
    Layout::new(width, height)
        .find_heap(x, &heaps)
        .map(|index| index as u32)
}

#[wasm_bindgen(js_name = "findAmount")]
pub fn find_amount(
    y: f64,
    heap_index: usize,
    width: f64,
    height: f64,
    heaps: Vec<u32>,
) -> Option<u32> {
    Layout::new(width, height).find_amount(y, heap_index, &heaps)
}

#[wasm_bindgen(js_name = "validateHeaps")]
pub fn validate_heaps(heaps: JsValue) -> Result<(), JsValue> {
    let heaps: HeapState = from_value(heaps).map_err(JsValue::from)?;
    heaps.integrity_check().map_err(|error| {
        to_value(&error)
            .unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
    })
}
