//! `reqwest`-backed [`crate::engine::DownloadEngine`].
//!
//! Each requested URL becomes one task: the GET is sent right away, the
//! resulting [`HttpTransferItem`] is handed to the origin's oldest listener,
//! and the body is only written once a save path has been assigned.

mod engine;
mod filename;
mod item;

pub use engine::{DEFAULT_USER_AGENT, HttpEngine};
pub use item::HttpTransferItem;
