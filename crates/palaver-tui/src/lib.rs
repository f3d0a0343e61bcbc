//! Terminal UI for Palaver
//!
//! A thin shell over [`palaver_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`palaver_app::Runtime`].
//!
//! This crate only handles terminal input, rendering, and display name
//! entry.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod name;
pub mod terminal;
pub mod ui;

pub use name::{DisplayName, NameError};
pub use palaver_app::{ChatScreen, Driver, Exit, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
