pub mod category;
pub mod task;
pub mod user;

pub use category::*;
pub use task::*;
pub use user::*;
