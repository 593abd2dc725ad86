//! Bitmap text system
//!
//! Bitmap fonts, styled text runs, layout and quad generation.

pub mod batch;
pub mod color;
pub mod font;
pub mod layout;
pub mod quad;
pub mod style;
pub mod word;

pub use batch::*;
pub use color::*;
pub use font::*;
pub use layout::*;
pub use quad::*;
pub use style::*;
