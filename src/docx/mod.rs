//! The `.docx` codec: zip container, XML tree, positional index and the
//! WordprocessingML helpers the engines build on.

pub mod document;
pub mod format;
pub mod index;
pub mod media;
pub mod package;
pub mod template;
pub mod wml;
pub mod xml;

pub use document::Document;
