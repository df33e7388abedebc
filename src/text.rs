//! Font resolution for text layers.

mod font;

pub use font::{FontMap, FontSpec};
