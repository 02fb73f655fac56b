//! WASM bindings for the 3D building viewer
//!
//! The browser host fetches buildings and chat answers from the REST API and
//! hands the JSON to a `ViewerSession`. The session owns the scene: it
//! projects and extrudes footprints, tracks the highlight set, and decides
//! where the camera goes. JavaScript only uploads the mesh buffers to WebGL,
//! applies the camera pose and forwards clicks.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { ViewerSession } from './pkg/building_viewer_wasm.js';
//!
//! await init();
//!
//! const session = new ViewerSession();
//! const pose = session.setBuildings(await (await fetch('/api/buildings')).text());
//! draw(session.positions(false), session.normals(false), session.indices(false));
//!
//! const answer = await postChat("What is the tallest building?");
//! const next = session.applyChatResponse(JSON.stringify(answer));
//! if (next) camera.set(next.position, next.target);
//!
//! canvas.onclick = (e) => showInfo(session.pick(ndcX(e), ndcY(e)));
//! ```

#[macro_use]
mod console;
pub mod session;

use wasm_bindgen::prelude::*;

pub use session::ViewerSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
