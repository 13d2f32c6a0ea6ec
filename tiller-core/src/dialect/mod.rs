mod mysql;
mod oracle;
mod postgres;
mod sql_server;

pub use mysql::*;
pub use oracle::*;
pub use postgres::*;
pub use sql_server::*;
