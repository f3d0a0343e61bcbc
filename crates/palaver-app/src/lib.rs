//! Application layer for Palaver
//!
//! Screen state machine and generic runtime shared by every frontend. The
//! same orchestration code runs in the terminal client and in tests with
//! virtual time.
//!
//! # Components
//!
//! - [`ChatScreen`]: Compose field, scroll position, and status notice
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop feeding the client session

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod input;
mod intent;
mod runtime;
mod screen;

pub use driver::{Driver, Input};
pub use input::KeyInput;
pub use intent::Intent;
pub use runtime::{Exit, Runtime};
pub use screen::{ChatScreen, Notice};
