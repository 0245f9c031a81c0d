pub mod index;
pub mod output;
pub mod producers;

pub use index::*;
pub use output::*;
pub use producers::*;
