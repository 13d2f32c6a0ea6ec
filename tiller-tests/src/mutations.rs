use crate::{Employee, column, departments, employees, setup};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use tiller::{
    Assignment, BulkInsert, Entity, Executor, ExprBuilder, InsertOrUpdate, OnConflict, Select,
    Statement, TillerError, Value,
};

async fn department_names<E: Executor>(executor: &mut E) -> Vec<(i32, String)> {
    let table = departments();
    let (id, name) = (column(&table, "id"), column(&table, "name"));
    let rows: Vec<_> = Select::new(&table)
        .order_by(id.clone().asc())
        .fetch(executor)
        .try_collect()
        .await
        .expect("Failed to query the departments");
    rows.iter()
        .map(|row| {
            let id = id.codec().decode(row.get_column(&id.label()).unwrap().clone());
            let name = name.codec().decode(row.get_column(&name.label()).unwrap().clone());
            match (id.unwrap(), name.unwrap()) {
                (Value::Int32(Some(id)), Value::Varchar(Some(name))) => (id, name),
                (id, name) => panic!("Unexpected department {:?} {:?}", id, name),
            }
        })
        .collect()
}

pub async fn insert_delete<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");

    // The generated key is read back
    let employee = Employee::new("Grace", Decimal::new(1_000_001, 3));
    employee
        .insert(executor)
        .await
        .expect("Failed to insert the employee");
    assert!(employee.record().is_attached());
    let id = employee.id().unwrap();
    assert!(id > 3, "Unexpected generated key {}", id);
    let loaded = Employee::find_one(
        executor,
        column(&employees(), "id").equal(id).unwrap(),
        false,
    )
    .await
    .unwrap()
    .expect("Failed to find the inserted employee");
    assert_eq!(loaded.name().unwrap(), "Grace");
    assert_eq!(loaded.salary().unwrap(), Decimal::new(1_000_001, 3));
    assert!(employee.record().diff().unwrap().is_empty());
    assert!(employee.insert(executor).await.is_err());

    // Flushes work right after the insert
    employee.set_name("Grace Hopper");
    assert_eq!(employee.flush(executor).await.unwrap(), 1);

    // Explicit keys are kept
    let explicit = Employee::new("Alan", Decimal::ZERO);
    explicit.set_id(100);
    explicit.insert(executor).await.unwrap();
    assert_eq!(explicit.id().unwrap(), 100);

    // Deleted records are detached
    assert_eq!(employee.delete(executor).await.unwrap(), 1);
    assert!(!employee.record().is_attached());
    let error = employee.flush(executor).await.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<TillerError>(),
        Some(TillerError::NotAttached(..))
    ));
    let remaining = Employee::find_many(executor, None, false).await.unwrap();
    let mut ids = remaining
        .iter()
        .map(|e| e.id().unwrap())
        .collect::<Vec<_>>();
    ids.sort();
    assert_eq!(ids, [1, 3, 100]);
}

pub async fn bulk<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");
    let table = departments();
    let (id, name) = (column(&table, "id"), column(&table, "name"));

    let mut insert = BulkInsert::new(&table);
    for (key, value) in [(3, "legal"), (4, "sales"), (5, "support")] {
        insert = insert.row(vec![
            Assignment::new(&id, key).unwrap(),
            Assignment::new(&name, value).unwrap(),
        ]);
    }
    let affected = Statement::BulkInsert(insert)
        .execute(executor)
        .await
        .expect("Failed to insert the departments");
    assert_eq!(affected.rows_affected, 3);
    assert_eq!(department_names(executor).await.len(), 5);

    // Rows with different columns never reach the database
    let insert = BulkInsert::new(&table)
        .row(vec![
            Assignment::new(&id, 6).unwrap(),
            Assignment::new(&name, "marketing").unwrap(),
        ])
        .row(vec![Assignment::new(&id, 7).unwrap()]);
    let error = Statement::BulkInsert(insert)
        .execute(executor)
        .await
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<TillerError>(),
        Some(TillerError::InconsistentBulkShape { index: 1, .. })
    ));
    assert_eq!(department_names(executor).await.len(), 5);

    // Conflicting rows take the proposed values
    let insert = BulkInsert::new(&table)
        .row(vec![
            Assignment::new(&id, 1).unwrap(),
            Assignment::new(&name, "engineering").unwrap(),
        ])
        .row(vec![
            Assignment::new(&id, 6).unwrap(),
            Assignment::new(&name, "marketing").unwrap(),
        ])
        .on_conflict(OnConflict::new([id.clone()]).update_excluded(&name).unwrap());
    Statement::BulkInsert(insert)
        .execute(executor)
        .await
        .expect("Failed to upsert the departments");
    let names = department_names(executor).await;
    assert_eq!(names.len(), 6);
    assert_eq!(names[0], (1, "engineering".to_string()));
    assert_eq!(names[5], (6, "marketing".to_string()));
}

pub async fn upsert<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");
    let table = departments();
    let (id, name) = (column(&table, "id"), column(&table, "name"));

    // Do nothing keeps the stored row
    let statement = InsertOrUpdate::new(&table)
        .set(&id, 2)
        .unwrap()
        .set(&name, "treasury")
        .unwrap();
    Statement::InsertOrUpdate(statement)
        .execute(executor)
        .await
        .expect("Failed to run the upsert");
    assert_eq!(department_names(executor).await[1].1, "finance");

    // Update only when the predicate holds
    let on_conflict = OnConflict::new([])
        .update_excluded(&name)
        .unwrap()
        .filter(name.clone().not_equal("tech").unwrap())
        .unwrap();
    for (key, value) in [(1, "platform"), (2, "treasury"), (9, "audit")] {
        let statement = InsertOrUpdate::new(&table)
            .set(&id, key)
            .unwrap()
            .set(&name, value)
            .unwrap()
            .on_conflict(on_conflict.clone());
        Statement::InsertOrUpdate(statement)
            .execute(executor)
            .await
            .expect("Failed to run the conditional upsert");
    }
    assert_eq!(
        department_names(executor).await,
        [
            (1, "tech".to_string()),
            (2, "treasury".to_string()),
            (9, "audit".to_string()),
        ]
    );
}
