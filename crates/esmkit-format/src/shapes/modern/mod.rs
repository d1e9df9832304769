//! Shapes of the modern dialect: `u16` subrecord lengths, localized strings
//! and compression.

mod flst;
mod glob;
mod kywd;
mod lscr;
mod tes4;

pub use flst::FormList;
pub use glob::Global;
pub use kywd::Keyword;
pub use lscr::{Condition, LoadScreen};
pub use tes4::Tes4Header;
