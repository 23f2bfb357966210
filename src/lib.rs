//! Window-manager-style coordination for terminal UI overlays.
//!
//! Dialogs, popovers, and palettes open and close independently but share
//! one screen, so something central has to own stacking order, Escape
//! priority, and scroll capture. This crate provides that center: a
//! [`kernel`] hosts pluggable modules, the [`overlay`] coordinator tracks
//! the open stack, [`controller`] queues drive dialog and popover
//! lifecycles, and [`placement`] computes where anchored panels land.
//! Rendering stays with the host application.

pub mod controller;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod modules;
pub mod overlay;
pub mod placement;

pub use error::KernelError;
pub use kernel::{Kernel, Module, Runtime};
