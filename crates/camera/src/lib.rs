//! Hot-reloadable Lua camera controller.
//!
//! The controller owns a Lua 5.4 interpreter, exposes a small 3D-math API
//! (`m3d`) and the frame's input to scripts, and watches the script file so
//! its `update` function can be swapped without restarting the render loop
//! or losing script state.
//!
//! # Invariants
//! - Persistent script state is created once by `init()` and survives every
//!   hot reload; only the `update` function is replaced.
//! - No script error escapes the host boundary; failures surface as
//!   `CameraError` values and the render loop keeps running.
//! - The controller is the exclusive owner of the interpreter and every
//!   handle into it.

pub mod bindings;
pub mod controller;
pub mod m3d;
pub mod watcher;

pub use controller::{CameraError, CameraFrame, Reload, ScriptCamera};
pub use watcher::ScriptWatcher;
