mod oset;
mod otree;

pub use oset::{CursorMut, Iter, OSet};
pub use otree::{Cursor, OTree};
