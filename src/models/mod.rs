pub mod load;
pub mod receipt;
pub mod user;

pub use load::*;
pub use receipt::*;
pub use user::*;
