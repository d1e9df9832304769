//! Shapes of the legacy dialect: `u32` subrecord lengths, no groups.

mod glob;
mod levi;
mod tes3;

pub use glob::{Global, GlobalValue};
pub use levi::{LeveledItem, LeveledItemEntry};
pub use tes3::Tes3Header;
