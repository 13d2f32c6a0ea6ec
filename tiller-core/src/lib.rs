mod as_value;
mod codec;
mod column;
mod connection;
mod dialect;
mod driver;
mod entity;
mod error;
mod executor;
mod expression;
mod query;
mod statement;
mod table;
mod util;
mod value;
mod writer;

pub use ::anyhow::Context as ErrorContext;
pub use as_value::*;
pub use codec::*;
pub use column::*;
pub use connection::*;
pub use dialect::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use executor::*;
pub use expression::*;
pub use futures;
pub use query::*;
pub use statement::*;
pub use table::*;
pub use util::*;
pub use value::*;
pub use writer::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
