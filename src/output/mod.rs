//! Pattern and capture artifacts on disk.

mod naming;
mod writer;

pub use naming::{ArtifactKind, FileNaming};
pub use writer::{ArtifactFormat, ArtifactWriter, ImageWriter, MemoryWriter, WriteError};
