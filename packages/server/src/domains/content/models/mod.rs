pub mod content_item;
pub mod view_counter;

pub use content_item::*;
pub use view_counter::*;
