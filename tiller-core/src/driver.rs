use crate::{Connection, SqlWriter};

pub trait Driver: Send + Sync {
    type Connection: Connection;
    type SqlWriter: SqlWriter;

    const NAME: &'static str;

    fn get_instance() -> Self;
    fn sql_writer(&self) -> Self::SqlWriter;
}
