mod materialize;
mod record;
mod tracker;
mod typed;

pub use materialize::*;
pub use record::*;
pub use tracker::*;
pub use typed::*;
