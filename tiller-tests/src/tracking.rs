use crate::{Department, Employee, column, departments, employees, setup};
use rust_decimal::Decimal;
use tiller::{Entity, Executor, ExprBuilder, Record, TillerError};

async fn load<E: Executor>(executor: &mut E, id: i32, with_references: bool) -> Employee {
    Employee::find_one(
        executor,
        column(&employees(), "id").equal(id).unwrap(),
        with_references,
    )
    .await
    .expect("Failed to query the employee")
    .expect("Failed to find the employee")
}

pub async fn tracking<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");

    // Fresh entities have nothing to write
    let employee = load(executor, 1, false).await;
    let diff = employee.record().diff().expect("Failed to diff");
    assert!(diff.is_empty(), "{:?}", diff);
    assert_eq!(employee.flush(executor).await.unwrap(), 0);

    // One property set, one column changed
    employee.set_name("Ada Lovelace");
    let diff = employee.record().diff().expect("Failed to diff");
    assert_eq!(diff.len(), 1);
    assert_eq!(diff.get("name"), Some(&"Ada Lovelace".into()));
    assert_eq!(employee.flush(executor).await.unwrap(), 1);
    assert!(employee.record().diff().unwrap().is_empty());
    assert!(!employee.record().is_dirty());
    let reloaded = load(executor, 1, false).await;
    assert_eq!(reloaded.name().unwrap(), "Ada Lovelace");
    assert_eq!(reloaded.salary().unwrap(), Decimal::new(4_250_075, 2));
    assert!(reloaded.record() == employee.record());

    // Setting the same value again is not a change
    reloaded.set_name("Ada Lovelace");
    assert!(reloaded.record().diff().unwrap().is_empty());

    // Nested paths and references write their columns
    employee.set_manager_id(3);
    let finance = Department::find_one(
        executor,
        column(&departments(), "id").equal(2).unwrap(),
        false,
    )
    .await
    .unwrap()
    .expect("Failed to find department 2");
    employee.set_department(&finance);
    let diff = employee.record().diff().unwrap();
    assert_eq!(diff.len(), 2);
    assert_eq!(diff.get("manager_id"), Some(&3.into()));
    assert_eq!(diff.get("department_id"), Some(&2.into()));
    assert_eq!(employee.flush(executor).await.unwrap(), 1);
    let reloaded = load(executor, 1, true).await;
    assert_eq!(reloaded.manager_id().unwrap(), Some(3));
    assert_eq!(reloaded.department().unwrap().name().unwrap(), "finance");

    // Keys cannot move
    employee.set_id(42);
    let error = employee.flush(executor).await.unwrap_err();
    assert!(
        matches!(
            error.downcast_ref::<TillerError>(),
            Some(TillerError::PrimaryKeyImmutable(property)) if property == "id"
        ),
        "{:#}",
        error
    );
    assert!(load(executor, 1, false).await.record() != employee.record());

    // Never stored
    let detached = Employee::new("Grace", Decimal::new(1, 0));
    let error = detached.flush(executor).await.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<TillerError>(),
        Some(TillerError::NotAttached(..))
    ));

    // Equality ignores identity but not nested values nor the entity type
    let a = load(executor, 3, true).await;
    let b = load(executor, 3, true).await;
    assert!(a.record() == b.record());
    b.department().unwrap().set_name("accounting");
    assert!(a.record() != b.record());
    let other = Record::new("Contractor");
    for (property, value) in [("id", 3), ("manager_id", 1)] {
        other.set(property, value);
    }
    assert!(other != *a.record());
}

pub async fn unflushed<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");

    let employee = load(executor, 1, true).await;
    let department = employee.department().unwrap();
    department.set_name("research");
    employee.set_name("Countess");

    let error = employee.flush(executor).await.unwrap_err();
    assert!(
        matches!(
            error.downcast_ref::<TillerError>(),
            Some(TillerError::UnflushedNestedChanges(path)) if path == "department"
        ),
        "{:#}",
        error
    );
    // Nothing reached the database
    let stored = load(executor, 1, true).await;
    assert_eq!(stored.name().unwrap(), "Ada");
    assert_eq!(stored.department().unwrap().name().unwrap(), "tech");

    // Once the department is written the owner flushes
    assert_eq!(department.flush(executor).await.unwrap(), 1);
    assert_eq!(employee.flush(executor).await.unwrap(), 1);
    let stored = load(executor, 1, true).await;
    assert_eq!(stored.name().unwrap(), "Countess");
    assert_eq!(stored.department().unwrap().name().unwrap(), "research");

    // Nested records owned by the graph are written with it
    employee.set_manager_id(3);
    assert_eq!(employee.flush(executor).await.unwrap(), 1);
    assert_eq!(load(executor, 1, false).await.manager_id().unwrap(), Some(3));
}
