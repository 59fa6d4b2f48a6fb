//! Repository collection and per-repository handles

pub mod dir;
pub mod handle;
pub mod sanitize;

pub use dir::ReposDir;
pub use handle::{GitRepo, Page};
pub use sanitize::sanitize_repository_id;
