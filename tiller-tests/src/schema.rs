use rust_decimal::Decimal;
use std::sync::LazyLock;
use tiller::{
    Assignment, BulkInsert, Column, Entity, Executor, NestedStep, Query, Record, Result,
    Statement, Table, Value,
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
        .column("salary", Value::Decimal(None))
        .bind_to("salary")
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

pub fn column(table: &Table, name: &str) -> Column {
    table.column(name).unwrap_or_else(|e| panic!("{:#}", e))
}

pub struct Department(Record);

impl Entity for Department {
    fn table() -> Table {
        departments()
    }
    fn from_record(record: Record) -> Self {
        Self(record)
    }
    fn record(&self) -> &Record {
        &self.0
    }
}

impl Department {
    pub fn id(&self) -> Result<i32> {
        self.0.get("id")
    }
    pub fn name(&self) -> Result<String> {
        self.0.get("name")
    }
    pub fn set_name(&self, name: &str) {
        self.0.set("name", name);
    }
}

pub struct Employee(Record);

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

impl Employee {
    pub fn new(name: &str, salary: Decimal) -> Self {
        let record = Record::new("Employee");
        record.set("name", name);
        record.set("salary", salary);
        Self(record)
    }
    pub fn id(&self) -> Result<i32> {
        self.0.get("id")
    }
    pub fn set_id(&self, id: i32) {
        self.0.set("id", id);
    }
    pub fn name(&self) -> Result<String> {
        self.0.get("name")
    }
    pub fn set_name(&self, name: &str) {
        self.0.set("name", name);
    }
    pub fn salary(&self) -> Result<Decimal> {
        self.0.get("salary")
    }
    pub fn department(&self) -> Option<Department> {
        self.0.entity("department").map(Department)
    }
    pub fn set_department(&self, department: &Department) {
        self.0.set_entity("department", &department.0);
    }
    pub fn manager_id(&self) -> Result<Option<i32>> {
        match self.0.entity("manager") {
            Some(manager) => manager.get_opt("id"),
            None => Ok(None),
        }
    }
    pub fn set_manager_id(&self, id: i32) {
        self.0.nested("manager", "Manager").set("id", id);
    }
}

/// Recreate the tables and load departments 1 and 2 with employees 1 and 3.
///
/// Decimals are stored as text so that no engine rounds them.
pub async fn setup<E: Executor>(executor: &mut E) -> Result<()> {
    for sql in [
        "DROP TABLE IF EXISTS t_employee",
        "DROP TABLE IF EXISTS t_department",
        "CREATE TABLE t_department (id INTEGER PRIMARY KEY, name VARCHAR(64))",
        "CREATE TABLE t_employee (id INTEGER PRIMARY KEY, name VARCHAR(64), salary TEXT, department_id INTEGER REFERENCES t_department(id), manager_id INTEGER)",
    ] {
        executor.execute(Query::new(sql)).await?;
    }
    let (id, name) = (column(&DEPARTMENTS, "id"), column(&DEPARTMENTS, "name"));
    let mut insert = BulkInsert::new(&DEPARTMENTS);
    for (key, value) in [(1, "tech"), (2, "finance")] {
        insert = insert.row(vec![
            Assignment::new(&id, key)?,
            Assignment::new(&name, value)?,
        ]);
    }
    Statement::BulkInsert(insert).execute(executor).await?;
    let columns =
        ["id", "name", "salary", "department_id", "manager_id"].map(|c| column(&EMPLOYEES, c));
    let mut insert = BulkInsert::new(&EMPLOYEES);
    for (key, value, salary, department, manager) in [
        (1, "Ada", Decimal::new(4_250_075, 2), 1, Value::Int32(None)),
        (3, "Linus", Decimal::new(3_900_000, 2), 2, Value::Int32(Some(1))),
    ] {
        insert = insert.row(vec![
            Assignment::new(&columns[0], key)?,
            Assignment::new(&columns[1], value)?,
            Assignment::new(&columns[2], salary)?,
            Assignment::new(&columns[3], department)?,
            Assignment::new(&columns[4], manager)?,
        ]);
    }
    Statement::BulkInsert(insert).execute(executor).await?;
    Ok(())
}
