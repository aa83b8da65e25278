//! Persistent, observer-backed slot containers keyed by world position.

mod config;
mod container;
mod fileio;
mod layout;
mod pos;
mod store;
mod view;

pub use config::*;
pub use container::*;
pub use fileio::*;
pub use layout::*;
pub use pos::*;
pub use store::*;
pub use view::*;
