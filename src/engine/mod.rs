pub mod compute;
pub mod context;
pub mod flags;
pub mod result;

mod filter;
mod value;

pub use compute::*;
pub use context::*;
pub use flags::*;
pub use result::*;
