mod classify;
mod collection;
mod file;

pub use classify::{classify, media_type_for_path};
pub use collection::FileCollection;
pub use file::{Category, ImageKind, InputFile};
