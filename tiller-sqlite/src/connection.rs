use crate::{
    CBox, SqliteDriver,
    bind::bind_value,
    error_message_from_ptr,
    extract::{extract_name, extract_value},
};
use async_stream::try_stream;
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, CString, c_int},
    ptr,
    sync::Arc,
};
use tiller_core::{
    Connection, Driver, Error, ErrorContext, Executor, Query, QueryResult, Result, RowLabeled,
    Row, RowsAffected, futures::Stream, truncate_long,
};
use tokio::task::spawn_blocking;

pub struct SqliteConnection {
    pub(crate) connection: CBox<*mut sqlite3>,
}

/// Compile `query` and bind its parameters, the connection is borrowed, not owned.
fn prepare(connection: CBox<*mut sqlite3>, query: Query) -> Result<CBox<*mut sqlite3_stmt>> {
    let context = || format!("While preparing the query:\n{}", truncate_long!(query.sql));
    let sql = CString::new(query.sql.as_bytes()).with_context(context)?;
    unsafe {
        let mut statement = CBox::new(ptr::null_mut(), |p| {
            sqlite3_finalize(p);
        });
        let mut tail = ptr::null();
        let rc = sqlite3_prepare_v2(
            *connection,
            sql.as_ptr(),
            -1,
            &mut *statement,
            &mut tail,
        );
        if rc != SQLITE_OK {
            let error = Error::msg(error_message_from_ptr(&sqlite3_errmsg(*connection)).to_string())
                .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        if !tail.is_null() && !CStr::from_ptr(tail).to_string_lossy().trim().is_empty() {
            let error =
                Error::msg("Cannot prepare more than one statement at a time").context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let expected = sqlite3_bind_parameter_count(*statement) as usize;
        if expected != query.params.len() {
            let error = Error::msg(format!(
                "The query expects {} parameters but {} were provided",
                expected,
                query.params.len()
            ))
            .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        for (i, value) in query.params.iter().enumerate() {
            bind_value(&statement, (i + 1) as c_int, value)?;
        }
        Ok(statement)
    }
}

impl Executor for SqliteConnection {
    type Driver = SqliteDriver;

    fn driver(&self) -> &Self::Driver {
        &SqliteDriver {}
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        let connection = CBox::new(*self.connection, |_| {});
        try_stream! {
            let statement = spawn_blocking(move || prepare(connection, query)).await??;
            let count = unsafe { sqlite3_column_count(*statement) };
            let labels = (0..count)
                .map(|i| extract_name(*statement, i))
                .collect::<Result<Arc<[_]>>>()?;
            loop {
                match unsafe { sqlite3_step(*statement) } {
                    SQLITE_BUSY => continue,
                    SQLITE_ROW => {
                        let values: Row = (0..count)
                            .map(|i| extract_value(*statement, i))
                            .collect::<Result<_>>()?;
                        yield QueryResult::Row(RowLabeled::new(labels.clone(), values));
                    }
                    SQLITE_DONE => break,
                    _ => {
                        let message = unsafe {
                            error_message_from_ptr(&sqlite3_errmsg(sqlite3_db_handle(*statement)))
                                .to_string()
                        };
                        Err::<(), _>(Error::msg(message))?;
                    }
                }
            }
            if count == 0 {
                let (rows_affected, last_affected_id) = unsafe {
                    let db = sqlite3_db_handle(*statement);
                    (sqlite3_changes64(db) as u64, sqlite3_last_insert_rowid(db))
                };
                yield QueryResult::Affected(RowsAffected {
                    rows_affected,
                    last_affected_id: Some(last_affected_id),
                });
            }
        }
    }
}

impl Connection for SqliteConnection {
    async fn connect(url: &str) -> Result<SqliteConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        if !url.starts_with(&prefix) {
            let error = Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        }
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let path = CString::new(url.trim_start_matches(&prefix)).with_context(context)?;
        let mut connection: CBox<*mut sqlite3>;
        unsafe {
            connection = CBox::new(ptr::null_mut(), |p| {
                sqlite3_close(p);
            });
            let rc = sqlite3_open_v2(
                path.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            );
            if rc != SQLITE_OK {
                let message = if connection.is_null() {
                    "Out of memory".to_string()
                } else {
                    error_message_from_ptr(&sqlite3_errmsg(*connection)).to_string()
                };
                let error = Error::msg(message).context(format!("Cannot open `{}`", url));
                log::error!("{:#}", error);
                return Err(error);
            }
        }
        log::debug!("Opened sqlite database `{}`", url);
        Ok(Self { connection })
    }
}
