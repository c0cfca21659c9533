//! wgpu render backend for the scriptcam demo.
//!
//! Draws a textured ground plane and a spinning textured cube. The view
//! matrix arrives from the scripted camera controller every frame; this
//! crate only composes and submits draw calls.
//!
//! # Invariants
//! - The renderer never talks to the controller; it consumes finished MVP
//!   matrices.
//! - GPU handles are owned fields, released by Drop in reverse acquisition
//!   order.

mod gpu;
mod shaders;

pub use gpu::SceneRenderer;
