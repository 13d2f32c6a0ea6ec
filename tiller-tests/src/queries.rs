use crate::{column, departments, employees, setup};
use futures::TryStreamExt;
use tiller::{
    Executor, ExprBuilder, RowLabeled, Select, Source, Value, case_when, count_all, exists, max,
    row_number,
};

async fn fetch<E: Executor>(executor: &mut E, select: &Select) -> Vec<RowLabeled> {
    select
        .fetch(executor)
        .try_collect()
        .await
        .expect("Failed to fetch the rows")
}

fn ints(rows: &[RowLabeled], label: &str) -> Vec<i64> {
    rows.iter()
        .map(|row| match row.get_column(label) {
            Some(Value::Int64(Some(v))) => *v,
            v => panic!("Unexpected value {:?} for `{}`", v, label),
        })
        .collect()
}

pub async fn pagination<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");
    let table = employees();
    let id = column(&table, "id");
    let select = || Select::new(&table).column(&id).order_by(id.clone().asc());

    assert_eq!(ints(&fetch(executor, &select()).await, "t_employee_id"), [1, 3]);
    assert_eq!(
        ints(&fetch(executor, &select().limit(1)).await, "t_employee_id"),
        [1]
    );
    assert_eq!(
        ints(&fetch(executor, &select().limit(1).offset(1)).await, "t_employee_id"),
        [3]
    );
    assert_eq!(
        ints(&fetch(executor, &select().offset(1)).await, "t_employee_id"),
        [3]
    );
    assert!(fetch(executor, &select().offset(2)).await.is_empty());
}

pub async fn queries<E: Executor>(executor: &mut E) {
    setup(executor).await.expect("Failed to set up the tables");
    let (e, m, d) = (
        employees().aliased("e"),
        employees().aliased("m"),
        departments().aliased("d"),
    );

    // Self join through two aliases of the same table
    let source = Source::from(&e)
        .left_join(
            &m,
            column(&e, "manager_id").equal(column(&m, "id")).unwrap(),
        )
        .unwrap()
        .inner_join(
            &d,
            column(&e, "department_id").equal(column(&d, "id")).unwrap(),
        )
        .unwrap();
    let select = Select::new(source)
        .column(column(&e, "name"))
        .column(column(&m, "name"))
        .column(column(&d, "name"))
        .order_by(column(&e, "id").asc());
    let rows = fetch(executor, &select).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].labels(), ["e_name", "m_name", "d_name"]);
    assert_eq!(
        rows[1].values(),
        [
            Value::Varchar(Some("Linus".into())),
            Value::Varchar(Some("Ada".into())),
            Value::Varchar(Some("finance".into())),
        ]
    );
    assert!(rows[0].values()[1].is_null());

    // Aggregates and grouping
    let department_id = column(&e, "department_id");
    let select = Select::new(&e)
        .column(&department_id)
        .labeled(count_all(), "total")
        .labeled(max(column(&e, "id")).unwrap(), "last")
        .group_by(&department_id)
        .having(count_all().greater(0).unwrap())
        .unwrap()
        .order_by(department_id.clone().desc());
    let rows = fetch(executor, &select).await;
    assert_eq!(ints(&rows, "e_department_id"), [2, 1]);
    assert_eq!(ints(&rows, "total"), [1, 1]);
    assert_eq!(ints(&rows, "last"), [3, 1]);

    // Predicates
    let id = column(&e, "id");
    let name = column(&e, "name");
    let select = |predicate| {
        Select::new(&e)
            .column(&id)
            .filter(predicate)
            .unwrap()
            .order_by(id.clone().asc())
    };
    for (predicate, expected) in [
        (name.clone().like("A%").unwrap(), vec![1]),
        (name.clone().not_like("A%").unwrap(), vec![3]),
        (id.clone().in_list([3, 4, 5]).unwrap(), vec![3]),
        (id.clone().not_in_list([3]).unwrap(), vec![1]),
        (id.clone().between(0, 2).unwrap(), vec![1]),
        (column(&e, "manager_id").is_null(), vec![1]),
        (column(&e, "manager_id").is_not_null(), vec![3]),
        (
            id.clone()
                .in_subquery(Select::new(&m).column(column(&m, "manager_id")))
                .unwrap(),
            vec![1],
        ),
        (
            id.clone()
                .plus(1)
                .unwrap()
                .times(2)
                .unwrap()
                .equal(8)
                .unwrap(),
            vec![3],
        ),
        (
            id.clone()
                .equal(1)
                .unwrap()
                .or(id.clone().equal(3).unwrap())
                .unwrap()
                .not()
                .unwrap(),
            vec![],
        ),
    ] {
        let rows = fetch(executor, &select(predicate)).await;
        assert_eq!(ints(&rows, "e_id"), expected);
    }

    // Correlated subquery
    let staffed = Select::new(&d)
        .column(column(&d, "id"))
        .filter(exists(
            Select::new(&e)
                .column(&id)
                .filter(
                    column(&e, "department_id")
                        .equal(column(&d, "id"))
                        .unwrap(),
                )
                .unwrap(),
        ))
        .unwrap()
        .order_by(column(&d, "id").asc());
    assert_eq!(ints(&fetch(executor, &staffed).await, "d_id"), [1, 2]);

    // Case, cast and window
    let select = Select::new(&e)
        .labeled(
            case_when()
                .when(id.clone().equal(1).unwrap(), "first")
                .unwrap()
                .otherwise("other")
                .unwrap(),
            "rank",
        )
        .labeled(id.clone().cast(Value::Varchar(None)), "text")
        .labeled(row_number().over(vec![], vec![id.clone().desc()]), "position")
        .order_by(id.clone().asc());
    let rows = fetch(executor, &select).await;
    assert_eq!(
        rows[0].get_column("rank"),
        Some(&Value::Varchar(Some("first".into())))
    );
    assert_eq!(
        rows[1].get_column("rank"),
        Some(&Value::Varchar(Some("other".into())))
    );
    assert_eq!(
        rows[1].get_column("text"),
        Some(&Value::Varchar(Some("3".into())))
    );
    assert_eq!(ints(&rows, "position"), [2, 1]);

    // Set operations order the whole result
    let union = Select::new(&e)
        .column(&id)
        .filter(id.clone().equal(3).unwrap())
        .unwrap()
        .union_all(Select::new(&d).column(column(&d, "id")))
        .order_by(id.clone().desc());
    assert_eq!(ints(&fetch(executor, &union).await, "e_id"), [3, 2, 1]);
}
