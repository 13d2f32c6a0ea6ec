use std::sync::LazyLock;
use tiller::{
    Connection, Driver, Entity, Executor, GenericSqlWriter, NestedStep, Query, QueryResult,
    Record, Result, RowLabeled, RowsAffected, Table, Value,
    futures::{Stream, stream},
};

pub static DEPARTMENTS: LazyLock<Table> = LazyLock::new(|| {
    Table::builder("t_department")
        .entity("Department")
        .column("id", Value::Int32(None))
        .primary_key()
        .bind_to("id")
        .column("name", Value::Varchar(None))
        .bind_to("name")
        .build()
        .expect("Invalid department table")
});

static MANAGER: [NestedStep; 1] = [NestedStep {
    property: "manager",
    entity: "Manager",
}];

pub static EMPLOYEES: LazyLock<Table> = LazyLock::new(|| {
    Table::builder("t_employee")
        .entity("Employee")
        .column("id", Value::Int32(None))
        .primary_key()
        .bind_to("id")
        .column("name", Value::Varchar(None))
        .bind_to("name")
        .column("department_id", Value::Int32(None))
        .references("department", departments)
        .column("manager_id", Value::Int32(None))
        .bind_nested(&MANAGER, "id")
        .build()
        .expect("Invalid employee table")
});

pub fn departments() -> Table {
    DEPARTMENTS.clone()
}

pub fn employees() -> Table {
    EMPLOYEES.clone()
}

pub struct Employee(pub Record);

impl Entity for Employee {
    fn table() -> Table {
        employees()
    }
    fn from_record(record: Record) -> Self {
        Self(record)
    }
    fn record(&self) -> &Record {
        &self.0
    }
}

/// Row as returned by a driver, labels paired with raw values.
pub fn row(cells: &[(&str, Value)]) -> RowLabeled {
    RowLabeled::new(
        cells.iter().map(|(label, _)| label.to_string()).collect(),
        cells.iter().map(|(_, value)| value.clone()).collect(),
    )
}

/// Employee 3 working in department 2 "finance", managed by 1, with the department columns joined.
pub fn employee_row() -> RowLabeled {
    row(&[
        ("t_employee_id", Value::Int64(Some(3))),
        ("t_employee_name", Value::Varchar(Some("Linus".into()))),
        ("t_employee_department_id", Value::Int64(Some(2))),
        ("t_employee_manager_id", Value::Int64(Some(1))),
        ("_ref0_id", Value::Int64(Some(2))),
        ("_ref0_name", Value::Varchar(Some("finance".into()))),
    ])
}

pub struct RecordingDriver;

impl Driver for RecordingDriver {
    type Connection = Recorder;
    type SqlWriter = GenericSqlWriter;

    const NAME: &'static str = "recording";

    fn get_instance() -> Self {
        RecordingDriver
    }

    fn sql_writer(&self) -> GenericSqlWriter {
        GenericSqlWriter::new()
    }
}

/// Executor keeping every query it receives.
///
/// Selects return `rows`, every other statement affects one row and reports `generated_key`.
#[derive(Default)]
pub struct Recorder {
    pub queries: Vec<Query>,
    pub rows: Vec<RowLabeled>,
    pub generated_key: Option<i64>,
}

impl Recorder {
    pub fn sql(&self) -> Vec<&str> {
        self.queries.iter().map(|q| q.sql.as_str()).collect()
    }
}

impl Executor for Recorder {
    type Driver = RecordingDriver;

    fn driver(&self) -> &Self::Driver {
        &RecordingDriver
    }

    fn run(&mut self, query: Query) -> impl Stream<Item = Result<QueryResult>> + Send {
        let results: Vec<Result<QueryResult>> = if query.sql.starts_with("SELECT") {
            self.rows.iter().cloned().map(|r| Ok(r.into())).collect()
        } else {
            vec![Ok(RowsAffected {
                rows_affected: 1,
                last_affected_id: self.generated_key,
            }
            .into())]
        };
        self.queries.push(query);
        stream::iter(results)
    }
}

impl Connection for Recorder {
    async fn connect(_url: &str) -> Result<Self> {
        Ok(Recorder::default())
    }
}
