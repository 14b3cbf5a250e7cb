use thiserror::Error;

mod clock;
pub use clock::*;
mod sync;
pub use sync::*;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("media handle failed to open: {0}")]
    HandleOpen(String),
}
