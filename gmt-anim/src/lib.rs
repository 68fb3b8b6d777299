//! Reader/writer and curve toolkit for the GMT family of animation containers.
//!
//! This crate is host-agnostic. It decodes skeletal (GMT), camera (CMT) and
//! static face-pose (IFA) containers into plain data, provides curve algebra
//! (root-motion split/merge, curve addition) and coordinate conversion between
//! file space and a Z-up host space, and exposes a channel-track bridge that a
//! DCC integration can drive without linking against one.

#![forbid(unsafe_code)]

mod algebra;
mod bridge;
mod cmt;
mod cursor;
mod error;
mod format;
mod gmt;
mod ifa;
mod model;
mod name;
mod transform;
mod version;

pub use algebra::*;
pub use bridge::*;
pub use cmt::*;
pub use error::*;
pub use format::*;
pub use gmt::*;
pub use ifa::*;
pub use model::*;
pub use name::*;
pub use transform::*;
pub use version::*;

pub(crate) use cursor::{Reader, Writer};

#[cfg(test)]
mod cursor_tests;



#[cfg(test)]
mod cmt_tests;

#[cfg(test)]
mod ifa_tests;
