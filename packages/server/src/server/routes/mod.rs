// HTTP routes
pub mod content;
pub mod health;
pub mod search;

pub use content::*;
pub use health::*;
pub use search::*;
