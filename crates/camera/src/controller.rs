//! The scripted camera controller: owns the Lua interpreter, the cached
//! `update` function, and the persistent script state.

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec2};
use mlua::prelude::*;

use scriptcam_input::{InputSnapshot, KeyMask};

use crate::bindings::{self, LuaMat4};
use crate::watcher::ScriptWatcher;

/// Errors from controller construction and per-frame updates.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to watch script directory: {0}")]
    Watch(#[from] notify::Error),
    #[error("lua error: {0}")]
    Lua(#[from] mlua::Error),
    #[error("script does not define a callable `update` function")]
    MissingUpdate,
    #[error("script does not define a callable `init` function")]
    MissingInit,
    #[error("script `init` must return a table")]
    InitNotTable,
    #[error("script `update` must return an m3d matrix")]
    NotAMatrix,
}

/// Outcome of a reload poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reload {
    /// No change detected on disk.
    Unchanged,
    /// The script changed and the new `update` function is now cached.
    Reloaded,
    /// The script changed but could not be reloaded; the previous `update`
    /// remains in effect.
    Failed,
}

/// What a successful per-frame update produces.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame {
    /// World-to-camera transform for this frame.
    pub view: Mat4,
    /// Whether pointer motion should drive the camera instead of the cursor.
    pub mouse_look: bool,
    /// Script-requested shutdown.
    pub quit: bool,
}

/// Owns one Lua interpreter and drives the controller script once per frame.
///
/// The cached function and state handles are declared before the interpreter
/// so they are released first on drop, and the whole controller is torn down
/// by RAII on any `load` failure; no partially-initialized value escapes.
pub struct ScriptCamera {
    update_fn: LuaFunction,
    state: LuaTable,
    lua: Lua,
    watcher: ScriptWatcher,
    script_path: PathBuf,
    prev_keys: KeyMask,
    mouse_look: bool,
}

impl ScriptCamera {
    /// Load the controller script and construct a ready camera.
    ///
    /// Registers the script API, opens the file watch, executes the script,
    /// caches its global `update` function, and calls `init()` once for the
    /// persistent state table. Every failure along the way aborts
    /// construction entirely.
    pub fn load(script_path: impl Into<PathBuf>) -> Result<Self, CameraError> {
        let script_path = script_path.into();

        let lua = Lua::new();
        bindings::register(&lua)?;

        let watcher = ScriptWatcher::watch(&script_path)?;

        let update_fn = run_script(&lua, &script_path)?;

        let state = match lua.globals().get::<LuaValue>("init")? {
            LuaValue::Function(init_fn) => match init_fn.call::<LuaValue>(())? {
                LuaValue::Table(t) => t,
                _ => return Err(CameraError::InitNotTable),
            },
            _ => return Err(CameraError::MissingInit),
        };

        tracing::info!(script = %script_path.display(), "camera controller loaded");

        Ok(Self {
            update_fn,
            state,
            lua,
            watcher,
            script_path,
            prev_keys: KeyMask::EMPTY,
            mouse_look: false,
        })
    }

    /// Poll the watcher and re-execute the script if it changed on disk.
    ///
    /// The cached `update` is replaced only when the new chunk loads and
    /// resolves cleanly; on any error the previous function keeps running.
    /// Persistent state is never reset here. Scripts rely on state
    /// surviving logic edits, so `init` is not re-invoked.
    pub fn reload_if_needed(&mut self) -> Reload {
        if !self.watcher.poll_changed() {
            return Reload::Unchanged;
        }

        match run_script(&self.lua, &self.script_path) {
            Ok(update_fn) => {
                tracing::debug!(script = %self.script_path.display(), "controller script reloaded");
                self.update_fn = update_fn;
                Reload::Reloaded
            }
            Err(err) => {
                tracing::warn!(
                    script = %self.script_path.display(),
                    "reload failed, keeping previous update: {err}"
                );
                Reload::Failed
            }
        }
    }

    /// Run one frame of the controller.
    ///
    /// Edge masks derive from the previous call's key mask. A script error
    /// or a non-matrix return is recoverable: it is logged here and the
    /// caller must not use any view matrix for this frame (the driver's
    /// policy is to hold the last-known-good one).
    pub fn update(
        &mut self,
        keys: KeyMask,
        mouse_delta: Vec2,
        dt: f32,
    ) -> Result<CameraFrame, CameraError> {
        let input = InputSnapshot::new(keys, self.prev_keys, mouse_delta, dt);
        self.prev_keys = keys;

        let input_tbl = bindings::input_table(&self.lua, &input)?;
        let ret = match self
            .update_fn
            .call::<LuaValue>((self.state.clone(), input_tbl, dt))
        {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("controller update failed: {err}");
                return Err(err.into());
            }
        };

        let view = match ret.as_userdata().and_then(|ud| ud.borrow::<LuaMat4>().ok()) {
            Some(m) => m.0,
            None => {
                tracing::warn!("controller update returned a non-matrix value");
                return Err(CameraError::NotAMatrix);
            }
        };

        // Mode flags live on the persistent state, not the return value, so
        // scripts can keep richer private state alongside them. A missing or
        // non-boolean mouse_look leaves the previous value in place; a
        // missing quit means false.
        if let LuaValue::Boolean(b) = self.state.get::<LuaValue>("mouse_look")? {
            self.mouse_look = b;
        }
        let quit = matches!(
            self.state.get::<LuaValue>("quit")?,
            LuaValue::Boolean(true)
        );

        Ok(CameraFrame {
            view,
            mouse_look: self.mouse_look,
            quit,
        })
    }

    /// Path of the script this controller is bound to.
    pub fn script_path(&self) -> &Path {
        &self.script_path
    }
}

/// Execute the script file and resolve its global `update` function.
fn run_script(lua: &Lua, path: &Path) -> Result<LuaFunction, CameraError> {
    let source = std::fs::read_to_string(path)?;
    lua.load(&source)
        .set_name(path.display().to_string())
        .exec()?;
    match lua.globals().get::<LuaValue>("update")? {
        LuaValue::Function(f) => Ok(f),
        _ => Err(CameraError::MissingUpdate),
    }
}
