use crate::{Executor, Expr, Record, Result, Table, materialize};
use futures::TryStreamExt;
use std::future::Future;

/// Domain type backed by a [`Record`], accessors route through the tracked getters and setters.
pub trait Entity: Sized {
    fn table() -> Table;
    fn from_record(record: Record) -> Self;
    fn record(&self) -> &Record;

    /// Every row matching `predicate`, materialized in query order.
    fn find_many<E: Executor>(
        executor: &mut E,
        predicate: Option<Expr>,
        with_references: bool,
    ) -> impl Future<Output = Result<Vec<Self>>> {
        async move {
            let table = Self::table();
            let mut select = table.select_entities(with_references)?;
            if let Some(predicate) = predicate {
                select = select.filter(predicate)?;
            }
            let rows: Vec<_> = select.fetch(executor).try_collect().await?;
            rows.iter()
                .map(|row| materialize(row, &table, with_references).map(Self::from_record))
                .collect()
        }
    }

    fn find_one<E: Executor>(
        executor: &mut E,
        predicate: Expr,
        with_references: bool,
    ) -> impl Future<Output = Result<Option<Self>>> {
        async move {
            let table = Self::table();
            let select = table
                .select_entities(with_references)?
                .filter(predicate)?
                .limit(1);
            let rows: Vec<_> = select.fetch(executor).try_collect().await?;
            rows.first()
                .map(|row| materialize(row, &table, with_references).map(Self::from_record))
                .transpose()
        }
    }

    fn insert<E: Executor>(&self, executor: &mut E) -> impl Future<Output = Result<()>> {
        async move { self.record().insert(executor, &Self::table()).await }
    }

    fn flush<E: Executor>(&self, executor: &mut E) -> impl Future<Output = Result<u64>> {
        self.record().flush(executor)
    }

    fn delete<E: Executor>(&self, executor: &mut E) -> impl Future<Output = Result<u64>> {
        self.record().delete(executor)
    }
}
