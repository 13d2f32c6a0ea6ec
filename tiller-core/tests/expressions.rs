#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::datetime;
    use tiller_core::{
        Assignment, Codec, Column, Context, Expr, ExprBuilder, GenericSqlWriter, Result, Select,
        SqlWriter, Table, TillerError, Value, and_all, case_when, count_all, count_distinct,
        exists, function, or_all, row_number, sum,
    };

    const WRITER: GenericSqlWriter = GenericSqlWriter {};

    fn employees() -> Table {
        Table::builder("employee")
            .column("id", Value::Int32(None))
            .primary_key()
            .column("name", Value::Varchar(None))
            .column("salary", Value::Decimal(None))
            .column("hired", Value::Timestamp(None))
            .column("active", Value::Varchar(None))
            .codec(Codec::transform(
                "yes_no",
                Codec::standard(&Value::Varchar(None)),
                Value::Boolean(None),
                |v| {
                    let flag = v == Value::Boolean(Some(true));
                    Ok(Value::Varchar(Some(if flag { "Y" } else { "N" }.into())))
                },
                |v| Ok(Value::Boolean(Some(v == Value::Varchar(Some("Y".into()))))),
            ))
            .build()
            .unwrap()
    }

    fn column(table: &Table, name: &str) -> Column {
        table.column(name).unwrap()
    }

    fn render(expr: &Expr) -> (String, Vec<Value>) {
        let mut context = Context::default();
        let mut out = String::new();
        WRITER.write_expression(&mut context, &mut out, expr).unwrap();
        (out, context.params)
    }

    fn sql(expr: Result<Expr>) -> String {
        render(&expr.unwrap()).0
    }

    fn assert_mismatch(result: Result<Expr>) {
        let error = result.unwrap_err();
        assert!(
            matches!(
                error.downcast_ref::<TillerError>(),
                Some(TillerError::TypeMismatch { .. })
            ),
            "Unexpected error: {:#}",
            error
        );
    }

    #[test]
    fn precedence() {
        let table = employees();
        let id = || column(&table, "id");
        let name = || column(&table, "name");
        assert_eq!(
            sql(id().plus(1).and_then(|e| e.times(2))),
            r#"("employee"."id" + ?) * ?"#
        );
        assert_eq!(
            sql(id().times(2).and_then(|e| e.plus(1))),
            r#""employee"."id" * ? + ?"#
        );
        assert_eq!(
            sql(id().minus(id().minus(1).unwrap())),
            r#""employee"."id" - ("employee"."id" - ?)"#
        );
        assert_eq!(
            sql(id().minus(id().times(3).unwrap())),
            r#""employee"."id" - "employee"."id" * ?"#
        );
        assert_eq!(
            sql(id().plus(1).and_then(|e| e.negate())),
            r#"-("employee"."id" + ?)"#
        );
        let a = || id().greater(1).unwrap();
        let b = || name().like("A%").unwrap();
        let c = || id().is_null();
        assert_eq!(
            sql(a().or(b()).and_then(|e| e.and(c()))),
            r#"("employee"."id" > ? OR "employee"."name" LIKE ?) AND "employee"."id" IS NULL"#
        );
        assert_eq!(
            sql(a().and(b()).and_then(|e| e.or(c()))),
            r#""employee"."id" > ? AND "employee"."name" LIKE ? OR "employee"."id" IS NULL"#
        );
        assert_eq!(
            sql(a().or(b()).and_then(|e| e.not())),
            r#"NOT ("employee"."id" > ? OR "employee"."name" LIKE ?)"#
        );
        assert_eq!(
            sql(id().between(1, 2)),
            r#""employee"."id" BETWEEN ? AND ?"#
        );
        assert_eq!(
            sql(id().plus(1).and_then(|e| e.in_list([2, 3]))),
            r#""employee"."id" + ? IN (?, ?)"#
        );
        assert_eq!(
            sql(id().not_in_list([4])),
            r#""employee"."id" NOT IN (?)"#
        );
    }

    #[test]
    fn junctions_stay_flat() {
        let table = employees();
        let id = column(&table, "id");
        let chained = id
            .clone()
            .greater(1)
            .and_then(|e| e.and(id.clone().less(10).unwrap()))
            .and_then(|e| e.and(id.clone().not_equal(5).unwrap()))
            .unwrap();
        let Expr::Junction(junction) = &chained else {
            panic!("Expected a junction, found {:?}", chained);
        };
        assert_eq!(junction.operands.len(), 3);
        assert_eq!(
            render(&chained).0,
            r#""employee"."id" > ? AND "employee"."id" < ? AND "employee"."id" != ?"#
        );
        assert_eq!(and_all([]).unwrap(), Expr::literal(true));
        assert_eq!(or_all([]).unwrap(), Expr::literal(false));
        let single = id.clone().equal(1).unwrap();
        assert_eq!(and_all([single.clone()]).unwrap(), single);
        assert_mismatch(and_all([single, id.into()]));
    }

    #[test]
    fn large_conjunction() {
        const SIZE: i32 = 100_000;
        let table = employees();
        let id = column(&table, "id");
        let predicate =
            and_all((0..SIZE).map(|i| id.clone().not_equal(i).unwrap())).unwrap();
        let Expr::Junction(junction) = &predicate else {
            panic!("Expected a junction");
        };
        assert_eq!(junction.operands.len(), SIZE as usize);

        let select = Select::new(&table)
            .column(&id)
            .filter(predicate)
            .unwrap();
        let query = WRITER.render(&select.into()).unwrap();
        assert_eq!(query.params.len(), SIZE as usize);
        assert_eq!(query.params[99_999], Value::Int32(Some(99_999)));
        assert!(
            query
                .sql
                .ends_with(r#""employee"."id" != ? AND "employee"."id" != ?"#)
        );

        // Folding with the binary operator appends instead of nesting
        let mut chained = id.clone().not_equal(0).unwrap();
        for i in 1..SIZE {
            chained = chained.and(id.clone().not_equal(i).unwrap()).unwrap();
        }
        let (out, params) = render(&chained);
        assert_eq!(params.len(), SIZE as usize);
        assert!(!out.contains('('));
        drop(chained);
    }

    #[test]
    fn literals_take_the_peer_codec() {
        let table = employees();
        let (id, salary, active) = (
            column(&table, "id"),
            column(&table, "salary"),
            column(&table, "active"),
        );
        assert_eq!(render(&id.clone().greater(10).unwrap()).1, [Value::Int32(Some(10))]);
        assert_eq!(
            render(&id.clone().equal(Value::Int64(Some(7))).unwrap()).1,
            [Value::Int32(Some(7))]
        );
        assert_eq!(
            render(&salary.clone().greater(10).unwrap()).1,
            [Value::Decimal(Some(Decimal::new(10, 0)))]
        );
        assert!(matches!(active.value_type(), Value::Boolean(None)));
        assert_eq!(
            render(&active.clone().equal(true).unwrap()).1,
            [Value::Varchar(Some("Y".into()))]
        );
        let assignment = Assignment::new(&active, false).unwrap();
        assert_eq!(render(&assignment.value).1, [Value::Varchar(Some("N".into()))]);
        assert_eq!(render(&Expr::literal(3i64)).1, [Value::Int64(Some(3))]);
        assert_eq!(
            render(&salary.clone().less(9.5f64).unwrap()).1,
            [Value::Decimal(Some(Decimal::new(95, 1)))]
        );
    }

    #[test]
    fn type_mismatch() {
        let table = employees();
        let (id, name, active) = (
            column(&table, "id"),
            column(&table, "name"),
            column(&table, "active"),
        );
        assert_mismatch(name.clone().greater(10));
        assert_mismatch(id.clone().like("1%"));
        assert_mismatch(name.clone().plus(1));
        assert_mismatch(name.clone().and(id.clone().greater(1).unwrap()));
        assert_mismatch(id.clone().not());
        assert_mismatch(name.clone().negate());
        assert_mismatch(id.clone().in_list(["a"]));
        assert_mismatch(id.clone().between(1, "z"));
        assert_mismatch(active.equal(1));

        // Same kind, but the literal does not fit the column
        let (salary, hired) = (column(&table, "salary"), column(&table, "hired"));
        assert_mismatch((&id).greater(1.5f64));
        assert_mismatch((&id).equal(Value::Int64(Some(i64::MAX))));
        assert_mismatch((&id).between(0, 1i64 << 40));
        assert_mismatch((&id).in_list([1.0f64, 2.5f64]));
        assert_mismatch(hired.clone().less(datetime!(2024-03-01 9:00 +1)));
        assert!(hired.less(datetime!(2024-03-01 9:00)).is_ok());
        assert!(salary.greater(Value::Int64(Some(i64::MAX))).is_ok());
        let error = Assignment::new(&id, 2.25f32).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TillerError>(),
            Some(TillerError::TypeMismatch { .. })
        ));
        assert_mismatch(sum(&name));
        assert_mismatch(
            case_when()
                .when(id.clone().equal(1).unwrap(), 1)
                .and_then(|c| c.otherwise("one")),
        );
        assert_mismatch(id.clone().in_subquery(Select::new(&table).column(&name)));
        assert!(Assignment::new(&id, "one").is_err());
        let error = Select::new(&table).filter(id.clone().into()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TillerError>(),
            Some(TillerError::TypeMismatch { .. })
        ));
        let error = Select::new(&table)
            .group_by(&name)
            .having(count_all())
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TillerError>(),
            Some(TillerError::TypeMismatch { .. })
        ));
        assert!(
            Select::new(&table)
                .group_by(&name)
                .having(count_all().greater(1).unwrap())
                .is_ok()
        );
    }

    #[test]
    fn functions_and_subqueries() {
        let table = employees();
        let other = table.aliased("o");
        let (id, name) = (column(&table, "id"), column(&table, "name"));
        assert_eq!(render(&count_all()).0, "COUNT(*)");
        assert_eq!(
            render(&count_distinct(&name).unwrap()).0,
            r#"COUNT(DISTINCT "employee"."name")"#
        );
        assert_eq!(
            render(&function("LOWER", [Expr::from(&name)], Value::Varchar(None))).0,
            r#"LOWER("employee"."name")"#
        );
        let window = row_number().over(vec![name.clone().into()], vec![id.clone().desc()]);
        assert_eq!(window.value_type(), Value::Int64(None));
        assert_eq!(
            render(&window).0,
            r#"ROW_NUMBER() OVER (PARTITION BY "employee"."name" ORDER BY "employee"."id" DESC)"#
        );
        let case = case_when()
            .when(id.clone().less(10).unwrap(), "low")
            .unwrap()
            .otherwise("high")
            .unwrap();
        assert_eq!(
            render(&case),
            (
                r#"CASE WHEN "employee"."id" < ? THEN ? ELSE ? END"#.to_string(),
                vec![
                    Value::Int32(Some(10)),
                    Value::Varchar(Some("low".into())),
                    Value::Varchar(Some("high".into())),
                ]
            )
        );
        let correlated = Select::new(&other)
            .column(column(&other, "id"))
            .filter(column(&other, "id").equal(&id).unwrap())
            .unwrap();
        assert_eq!(
            render(&exists(correlated)).0,
            "EXISTS (SELECT \"o\".\"id\" AS \"o_id\"\nFROM \"employee\" \"o\"\nWHERE \"o\".\"id\" = \"employee\".\"id\")"
        );
    }
}
