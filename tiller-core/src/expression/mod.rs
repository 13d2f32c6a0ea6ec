mod builder;
mod expr;
mod op;
mod ordered;

pub use builder::*;
pub use expr::*;
pub use op::*;
pub use ordered::*;
