use crate::{
    Driver, ErrorContext, Query, QueryResult, Result, RowLabeled, RowsAffected, Select, SqlWriter,
    Statement, TillerError, Value,
};
use futures::{
    Stream, StreamExt, TryStreamExt,
    future::{self, Either},
    stream,
};
use std::future::Future;

pub trait Executor: Send + Sized {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Send the query to the database, rows and affected counts come back in order.
    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Only the rows produced by the query.
    fn fetch(&mut self, query: Query) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(query).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Sum of the affected counts, rows are discarded.
    fn execute(&mut self, query: Query) -> impl Future<Output = Result<RowsAffected>> + Send {
        self.run(query)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}

fn render<E: Executor>(executor: &E, statement: &Statement) -> Result<Query> {
    let query = executor.driver().sql_writer().render(statement)?;
    log::debug!("{}", query);
    Ok(query)
}

fn failed<T>(result: Result<T>, sql: &str) -> Result<T> {
    result
        .with_context(|| TillerError::QueryExecution { sql: sql.into() })
        .inspect_err(|e| log::error!("{:#}", e))
}

impl Statement {
    /// Render with the executor dialect and run it.
    pub async fn execute<E: Executor>(&self, executor: &mut E) -> Result<RowsAffected> {
        let query = render(executor, self)?;
        let sql = query.sql.clone();
        failed(executor.execute(query).await, &sql)
    }

    /// Run an insert and return the key generated for the new row.
    pub async fn execute_returning_key<E: Executor>(&self, executor: &mut E) -> Result<Value> {
        let affected = self.execute(executor).await?;
        match affected.last_affected_id {
            Some(id) => Ok(Value::Int64(Some(id))),
            None => Err(crate::Error::msg(format!(
                "{} did not report a generated key",
                <E::Driver as Driver>::NAME
            ))),
        }
    }
}

impl Select {
    /// Rows produced by the select, labeled as in the select list.
    pub fn fetch<'e, E: Executor>(
        &self,
        executor: &'e mut E,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + use<'e, E> {
        match render(executor, &Statement::Select(self.clone())) {
            Ok(query) => {
                let sql = query.sql.clone();
                Either::Left(executor.fetch(query).map(move |row| failed(row, &sql)))
            }
            Err(e) => Either::Right(stream::once(future::ready(Err(e)))),
        }
    }
}
