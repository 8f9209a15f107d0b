pub mod program;
pub mod user;

pub use program::*;
pub use user::*;
