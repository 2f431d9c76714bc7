mod fat_blocks;
mod ops;
mod stage;
mod thin_blocks;

pub use fat_blocks::*;
pub use stage::*;
pub use thin_blocks::*;
