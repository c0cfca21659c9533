//! Input vocabulary for the camera controller: named keys, key masks, and
//! the per-frame snapshot handed to controller scripts.
//!
//! # Invariants
//! - `CamKey` bit values are stable; they are the script-visible `KEY` encoding.
//! - Edge masks derive from exactly one previous mask, no deeper history.
//! - This crate stays windowing-agnostic; mapping OS key codes to `CamKey`
//!   is the application's job.

pub mod keys;
pub mod snapshot;

pub use keys::{CamKey, KeyMask};
pub use snapshot::InputSnapshot;
