//! 在浏览器或 node 中运行：`wasm-pack test --node`。

#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;
use wasm_nim::{find_amount, find_heap, nim_sum_js, NimGame};
use web_sys::js_sys::Function;

#[wasm_bindgen_test]
fn free_functions_match_core() {
    assert_eq!(nim_sum_js(vec![3, 4, 5]), 2);
    assert_eq!(find_heap(150.0, 300.0, 100.0, vec![3, 4, 5]), Some(1));
    assert_eq!(find_heap(100.0, 300.0, 100.0, vec![3, 4, 5]), None);
    assert_eq!(find_amount(90.0, 1, 300.0, 100.0, vec![3, 4, 5]), Some(4));
}

#[wasm_bindgen_test]
fn subscribe_receives_redraws() {
    let config = r#"{"heap_count": 4, "seed": 3, "surface_width": 400.0, "surface_height": 300.0}"#;
    let mut game = NimGame::new(Some(config.to_string())).expect("config json");
    assert_eq!(game.heap_count(), 4);

    let calls = Rc::new(RefCell::new(0u32));
    let counter = calls.clone();
    let callback = Closure::<dyn FnMut(JsValue, bool, bool)>::new(
        move |_heaps: JsValue, _over: bool, _turn: bool| {
            *counter.borrow_mut() += 1;
        },
    );
    game.subscribe(callback.as_ref().unchecked_ref::<Function>().clone());

    game.on_reset();
    assert_eq!(*calls.borrow(), 1);

    assert!(game.on_heap_count_change(1));
    assert_eq!(game.heap_count(), 5);
    assert_eq!(*calls.borrow(), 2);

    let rect = game.chip_rect(0, 0).expect("bottom chip of first heap");
    assert_eq!(rect.len(), 4);
    assert!(game.on_click(rect[0] + rect[2] / 2.0, rect[1] + rect[3] / 2.0));
    assert!(*calls.borrow() >= 3);
    assert!(game.state_json().expect("state json").contains("ChipsRemoved"));
}

#[wasm_bindgen_test]
fn bad_config_is_rejected() {
    assert!(NimGame::new(Some("not json".to_string())).is_err());
}
