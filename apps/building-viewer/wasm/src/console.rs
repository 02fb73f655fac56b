//! Browser console logging; a no-op off wasm so native tests can run the session

#[cfg(target_arch = "wasm32")]
pub fn log(message: &str) {
    web_sys::console::log_1(&message.into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log(_message: &str) {}

macro_rules! console_log {
    ($($t:tt)*) => (crate::console::log(&format!($($t)*)))
}
