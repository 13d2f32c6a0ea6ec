use crate::{Department, Employee, column, employees, setup};
use tiller::{Entity, Executor, ExprBuilder, Property, Value};

pub async fn references<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");
    let id = column(&employees(), "id");

    // Without references the department is a placeholder holding only its key
    let employee = Employee::find_one(executor, id.clone().equal(1).unwrap(), false)
        .await
        .expect("Failed to query employee 1")
        .expect("Failed to find employee 1");
    assert_eq!(employee.name().unwrap(), "Ada");
    let department = employee.department().expect("Department should be a placeholder");
    assert_eq!(department.id().unwrap(), 1);
    assert_eq!(department.name().unwrap(), "");
    assert!(department.record().is_attached());
    assert!(department.record().value("name").is_none());

    // With references the joined row populates it
    let employee = Employee::find_one(executor, id.clone().equal(1).unwrap(), true)
        .await
        .expect("Failed to query employee 1 with references")
        .expect("Failed to find employee 1 with references");
    let department = employee.department().expect("Department should be joined");
    assert_eq!(department.id().unwrap(), 1);
    assert_eq!(department.name().unwrap(), "tech");
    assert_eq!(employee.manager_id().unwrap(), None);

    let employee = Employee::find_one(executor, id.clone().equal(3).unwrap(), true)
        .await
        .expect("Failed to query employee 3")
        .expect("Failed to find employee 3");
    assert_eq!(employee.department().unwrap().name().unwrap(), "finance");
    assert_eq!(employee.manager_id().unwrap(), Some(1));

    // Loaded in both ways the department is the same entity
    let all = Employee::find_many(executor, None, true)
        .await
        .expect("Failed to query the employees");
    assert_eq!(all.len(), 2);
    let departments = Department::find_many(executor, None, false)
        .await
        .expect("Failed to query the departments");
    assert_eq!(departments.len(), 2);
    assert!(
        all[0].department().unwrap().record() == departments[0].record(),
        "Joined department should equal the loaded one"
    );

    // A null foreign key is an explicit null
    executor
        .execute("UPDATE t_employee SET department_id = NULL WHERE id = 3".into())
        .await
        .expect("Failed to clear the department of employee 3");
    let employee = Employee::find_one(executor, id.equal(3).unwrap(), true)
        .await
        .expect("Failed to query employee 3")
        .expect("Failed to find employee 3");
    assert!(employee.department().is_none());
    assert!(matches!(
        employee.record().property("department"),
        Some(Property::Value(Value::Int32(None)))
    ));
}
