//! wasm 运行环境初始化。

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

/// 把 `tracing` 日志转发到浏览器控制台。重复调用无副作用。
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    let _ = tracing_wasm::try_set_as_global_default();
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {}
