#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rust_decimal::Decimal;
    use tiller_core::{
        Assignment, BulkInsert, Column, Delete, ExprBuilder, GenericSqlWriter, InsertOrUpdate,
        MySqlSqlWriter, OnConflict, OracleSqlWriter, PostgresSqlWriter, Query, Select, Source,
        SqlServerSqlWriter, SqlWriter, Statement, Table, TillerError, Update, Value,
    };

    const ANSI: GenericSqlWriter = GenericSqlWriter {};
    const POSTGRES: PostgresSqlWriter = PostgresSqlWriter {};
    const MYSQL: MySqlSqlWriter = MySqlSqlWriter {};
    const ORACLE: OracleSqlWriter = OracleSqlWriter {};
    const SQL_SERVER: SqlServerSqlWriter = SqlServerSqlWriter {};

    fn employees() -> Table {
        Table::builder("employee")
            .column("id", Value::Int32(None))
            .primary_key()
            .column("name", Value::Varchar(None))
            .column("salary", Value::Decimal(None))
            .build()
            .unwrap()
    }

    fn departments() -> Table {
        Table::builder("department")
            .column("id", Value::Int32(None))
            .primary_key()
            .column("name", Value::Varchar(None))
            .build()
            .unwrap()
    }

    fn column(table: &Table, name: &str) -> Column {
        table.column(name).unwrap()
    }

    fn count(value: i64) -> Value {
        Value::Int64(Some(value))
    }

    fn paginated(table: &Table) -> Select {
        let (id, name) = (column(table, "id"), column(table, "name"));
        Select::new(table)
            .column(&id)
            .column(&name)
            .filter(id.greater(10).unwrap())
            .unwrap()
            .order_by(name.asc())
            .limit(5)
            .offset(10)
    }

    fn render(writer: &dyn SqlWriter, statement: impl Into<Statement>) -> Query {
        writer.render(&statement.into()).unwrap()
    }

    fn render_error(writer: &dyn SqlWriter, statement: impl Into<Statement>) -> TillerError {
        let error = writer.render(&statement.into()).unwrap_err();
        match error.downcast::<TillerError>() {
            Ok(e) => e,
            Err(e) => panic!("Unexpected error: {:#}", e),
        }
    }

    #[test]
    fn pagination() {
        let table = employees();
        {
            let query = render(&ANSI, paginated(&table));
            assert_eq!(
                query.sql,
                indoc! {r#"
                    SELECT "employee"."id" AS "employee_id", "employee"."name" AS "employee_name"
                    FROM "employee"
                    WHERE "employee"."id" > ?
                    ORDER BY "employee"."name" ASC
                    OFFSET ? ROWS
                    FETCH FIRST ? ROWS ONLY
                "#}
                .trim()
            );
            assert_eq!(query.params, [Value::Int32(Some(10)), count(10), count(5)]);
        }
        {
            let query = render(&POSTGRES, paginated(&table));
            assert_eq!(
                query.sql,
                indoc! {r#"
                    SELECT "employee"."id" AS "employee_id", "employee"."name" AS "employee_name"
                    FROM "employee"
                    WHERE "employee"."id" > ?
                    ORDER BY "employee"."name" ASC
                    LIMIT ? OFFSET ?
                "#}
                .trim()
            );
            assert_eq!(query.params, [Value::Int32(Some(10)), count(5), count(10)]);
        }
        {
            let query = render(&MYSQL, paginated(&table));
            assert_eq!(
                query.sql,
                indoc! {"
                    SELECT `employee`.`id` AS `employee_id`, `employee`.`name` AS `employee_name`
                    FROM `employee`
                    WHERE `employee`.`id` > ?
                    ORDER BY `employee`.`name` ASC
                    LIMIT ?, ?
                "}
                .trim()
            );
            assert_eq!(query.params, [Value::Int32(Some(10)), count(10), count(5)]);
        }
        {
            let mut select = paginated(&table);
            select.limit = None;
            let query = render(&MYSQL, select);
            assert!(query.sql.ends_with("\nLIMIT ?, 18446744073709551615"));
            assert_eq!(query.params, [Value::Int32(Some(10)), count(10)]);
        }
        {
            let query = render(&ORACLE, paginated(&table));
            assert_eq!(
                query.sql,
                indoc! {r#"
                    SELECT * FROM (SELECT "_T".*, ROWNUM "_RN" FROM (
                    SELECT "EMPLOYEE"."ID" AS "EMPLOYEE_ID", "EMPLOYEE"."NAME" AS "EMPLOYEE_NAME"
                    FROM "EMPLOYEE"
                    WHERE "EMPLOYEE"."ID" > ?
                    ORDER BY "EMPLOYEE"."NAME" ASC
                    ) "_T" WHERE ROWNUM <= ?) WHERE "_RN" > ?
                "#}
                .trim()
            );
            assert_eq!(query.params, [Value::Int32(Some(10)), count(15), count(10)]);
        }
        {
            let query = render(&SQL_SERVER, paginated(&table));
            assert_eq!(
                query.sql,
                indoc! {"
                    SELECT * FROM (
                    SELECT [employee].[id] AS [employee_id], [employee].[name] AS [employee_name], ROW_NUMBER() OVER (ORDER BY [employee].[name] ASC) AS [_rownum]
                    FROM [employee]
                    WHERE [employee].[id] > ?
                    ) [_paged]
                    WHERE [_rownum] > ? AND [_rownum] <= ?
                    ORDER BY [_rownum]
                "}
                .trim()
            );
            assert_eq!(query.params, [Value::Int32(Some(10)), count(10), count(15)]);
        }
        {
            let mut select = paginated(&table);
            select.offset = None;
            let query = render(&SQL_SERVER, select);
            assert_eq!(
                query.sql,
                indoc! {"
                    SELECT TOP (?) [employee].[id] AS [employee_id], [employee].[name] AS [employee_name]
                    FROM [employee]
                    WHERE [employee].[id] > ?
                    ORDER BY [employee].[name] ASC
                "}
                .trim()
            );
            assert_eq!(query.params, [count(5), Value::Int32(Some(10))]);
        }
        {
            // The limit applies to the whole compound, not to its first branch
            let departments = departments();
            let id = column(&table, "id");
            let compound = Select::new(&table)
                .column(&id)
                .union_all(Select::new(&departments).column(column(&departments, "id")))
                .order_by(id.desc())
                .limit(3);
            let query = render(&SQL_SERVER, compound.clone());
            assert_eq!(
                query.sql,
                indoc! {"
                    SELECT TOP (?) * FROM (
                    SELECT [employee].[id] AS [employee_id]
                    FROM [employee]
                    UNION ALL
                    SELECT [department].[id] AS [department_id]
                    FROM [department]
                    ) [_compound]
                    ORDER BY [employee_id] DESC
                "}
                .trim()
            );
            assert_eq!(query.params, [count(3)]);
            let query = render(&POSTGRES, compound);
            assert!(query.sql.ends_with("ORDER BY \"employee_id\" DESC\nLIMIT ?"));
        }
    }

    #[test]
    fn unpaginated_select_lists_every_column() {
        let table = employees();
        let query = render(&ANSI, Select::new(&table));
        assert_eq!(
            query.sql,
            indoc! {r#"
                SELECT "employee"."id" AS "employee_id", "employee"."name" AS "employee_name", "employee"."salary" AS "employee_salary"
                FROM "employee"
            "#}
            .trim()
        );
        assert!(query.params.is_empty());
        let oracle = render(&ORACLE, Select::new(&table).distinct());
        assert!(oracle.sql.starts_with("SELECT DISTINCT \"EMPLOYEE\".\"ID\""));
        assert!(!oracle.sql.contains("ROWNUM"));
    }

    #[test]
    fn quoting() {
        let weird = Table::builder("we\"ird`na]me")
            .column("id", Value::Int32(None))
            .build()
            .unwrap();
        let delete = || Delete::new(&weird);
        assert_eq!(render(&ANSI, delete()).sql, r#"DELETE FROM "we""ird`na]me""#);
        assert_eq!(render(&MYSQL, delete()).sql, "DELETE FROM `we\"ird``na]me`");
        assert_eq!(render(&SQL_SERVER, delete()).sql, "DELETE FROM [we\"ird`na]]me]");
        assert_eq!(render(&ORACLE, delete()).sql, r#"DELETE FROM "WE""IRD`NA]ME""#);

        let qualified = Table::builder("ledger")
            .catalog("main")
            .schema("books")
            .column("id", Value::Int32(None))
            .build()
            .unwrap();
        assert_eq!(
            render(&POSTGRES, Delete::new(&qualified)).sql,
            r#"DELETE FROM "main"."books"."ledger""#
        );
    }

    #[test]
    fn aliased_sources() {
        let (e, d) = (employees().aliased("e"), departments().aliased("d"));
        let source = Source::from(&e)
            .inner_join(
                &d,
                column(&e, "id").equal(column(&d, "id")).unwrap(),
            )
            .unwrap();
        let select = Select::new(source)
            .column(column(&e, "name"))
            .column(column(&d, "name"))
            .filter(column(&d, "name").like("t%").unwrap())
            .unwrap();
        let query = render(&ANSI, select);
        assert_eq!(
            query.sql,
            indoc! {r#"
                SELECT "e"."name" AS "e_name", "d"."name" AS "d_name"
                FROM "employee" "e" INNER JOIN "department" "d" ON "e"."id" = "d"."id"
                WHERE "d"."name" LIKE ?
            "#}
            .trim()
        );
        assert_eq!(query.params, [Value::Varchar(Some("t%".into()))]);
    }

    #[test]
    fn compound_select_orders_by_label() {
        let (employees, departments) = (employees(), departments());
        let department_id = column(&departments, "id");
        let select = Select::new(&departments)
            .column(&department_id)
            .union_all(Select::new(&employees).column(column(&employees, "id")))
            .order_by(department_id.desc())
            .limit(2);
        let query = render(&POSTGRES, select);
        assert_eq!(
            query.sql,
            indoc! {r#"
                SELECT "department"."id" AS "department_id"
                FROM "department"
                UNION ALL
                SELECT "employee"."id" AS "employee_id"
                FROM "employee"
                ORDER BY "department_id" DESC
                LIMIT ?
            "#}
            .trim()
        );

        let misplaced = Select::new(&departments)
            .column(column(&departments, "id"))
            .union(Select::new(&employees).column(column(&employees, "id")).limit(1));
        assert!(ANSI.render(&misplaced.into()).is_err());
    }

    #[test]
    fn upsert() {
        let table = employees();
        let (id, name, salary) = (
            column(&table, "id"),
            column(&table, "name"),
            column(&table, "salary"),
        );
        let upsert = |on_conflict: OnConflict| {
            InsertOrUpdate::new(&table)
                .set(&id, 1)
                .unwrap()
                .set(&name, "Ada")
                .unwrap()
                .on_conflict(on_conflict)
        };
        let updating = || {
            OnConflict::new([id.clone()])
                .update_excluded(&name)
                .unwrap()
                .filter(salary.clone().greater(Decimal::new(100, 0)).unwrap())
                .unwrap()
        };
        {
            let query = render(&ANSI, upsert(updating()));
            assert_eq!(
                query.sql,
                indoc! {r#"
                    INSERT INTO "employee" ("id", "name") VALUES
                    (?, ?)
                    ON CONFLICT ("id") DO UPDATE SET
                    "name" = EXCLUDED."name"
                    WHERE "salary" > ?
                "#}
                .trim()
            );
            assert_eq!(
                query.params,
                [
                    Value::Int32(Some(1)),
                    Value::Varchar(Some("Ada".into())),
                    Value::Decimal(Some(Decimal::new(100, 0))),
                ]
            );
        }
        {
            let query = render(&POSTGRES, upsert(updating()));
            assert_eq!(
                query.sql,
                indoc! {r#"
                    INSERT INTO "employee" ("id", "name") VALUES
                    (?, ?)
                    ON CONFLICT ("id") DO UPDATE SET
                    "name" = EXCLUDED."name"
                    WHERE "employee"."salary" > ?
                "#}
                .trim()
            );
        }
        {
            let query = render(&ANSI, upsert(OnConflict::new([])));
            assert_eq!(
                query.sql,
                indoc! {r#"
                    INSERT INTO "employee" ("id", "name") VALUES
                    (?, ?)
                    ON CONFLICT ("id") DO NOTHING
                "#}
                .trim()
            );
        }
        {
            let on_conflict = OnConflict::new([])
                .update_excluded(&name)
                .unwrap()
                .update(&salary, Decimal::ZERO)
                .unwrap();
            let query = render(&MYSQL, upsert(on_conflict));
            assert_eq!(
                query.sql,
                indoc! {"
                    INSERT INTO `employee` (`id`, `name`) VALUES
                    (?, ?)
                    ON DUPLICATE KEY UPDATE
                    `name` = VALUES(`name`),
                    `salary` = ?
                "}
                .trim()
            );
            let query = render(&MYSQL, upsert(OnConflict::new([])));
            assert!(query.sql.ends_with("ON DUPLICATE KEY UPDATE\n`id` = `id`"));
        }
        assert!(matches!(
            render_error(&MYSQL, upsert(updating())),
            TillerError::Unsupported {
                dialect: "MySQL",
                ..
            }
        ));
        assert!(matches!(
            render_error(&ORACLE, upsert(updating())),
            TillerError::Unsupported {
                dialect: "Oracle",
                ..
            }
        ));
        assert!(matches!(
            render_error(&SQL_SERVER, upsert(OnConflict::new([]))),
            TillerError::Unsupported {
                dialect: "SQL Server",
                ..
            }
        ));
        let predicate_only = OnConflict::new([])
            .filter(salary.clone().is_null())
            .unwrap();
        assert!(matches!(
            render_error(&ANSI, upsert(predicate_only)),
            TillerError::Unsupported { .. }
        ));
    }

    #[test]
    fn bulk_insert() {
        let table = employees();
        let (id, name) = (column(&table, "id"), column(&table, "name"));
        let row = |key: i32, value: &str| {
            vec![
                Assignment::new(&id, key).unwrap(),
                Assignment::new(&name, value).unwrap(),
            ]
        };
        let bulk = || BulkInsert::new(&table).row(row(1, "Ada")).row(row(2, "Grace"));
        {
            let query = render(&ANSI, bulk());
            assert_eq!(
                query.sql,
                indoc! {r#"
                    INSERT INTO "employee" ("id", "name") VALUES
                    (?, ?),
                    (?, ?)
                "#}
                .trim()
            );
            assert_eq!(query.params.len(), 4);
        }
        {
            let query = render(&ORACLE, bulk());
            assert_eq!(
                query.sql,
                indoc! {r#"
                    INSERT ALL
                    INTO "EMPLOYEE" ("ID", "NAME") VALUES (?, ?)
                    INTO "EMPLOYEE" ("ID", "NAME") VALUES (?, ?)
                    SELECT 1 FROM DUAL
                "#}
                .trim()
            );
        }
        {
            let query = render(
                &POSTGRES,
                bulk().on_conflict(OnConflict::new([]).update_excluded(&name).unwrap()),
            );
            assert!(query.sql.ends_with(indoc! {r#"
                (?, ?)
                ON CONFLICT ("id") DO UPDATE SET
                "name" = EXCLUDED."name""#}));
        }
        {
            let swapped = bulk().row(vec![
                Assignment::new(&name, "Linus").unwrap(),
                Assignment::new(&id, 3).unwrap(),
            ]);
            let writers: [&dyn SqlWriter; 3] = [&ANSI, &ORACLE, &MYSQL];
            for writer in writers {
                let TillerError::InconsistentBulkShape {
                    index,
                    expected,
                    found,
                } = render_error(writer, swapped.clone())
                else {
                    panic!("Expected InconsistentBulkShape");
                };
                assert_eq!(index, 2);
                assert_eq!(expected, "id, name");
                assert_eq!(found, "name, id");
            }
        }
        {
            // No primary key to default the conflict target to
            let keyless = Table::builder("keyless")
                .column("code", Value::Varchar(None))
                .build()
                .unwrap();
            let code = column(&keyless, "code");
            let bulk = BulkInsert::new(&keyless)
                .row(vec![Assignment::new(&code, "a").unwrap()])
                .on_conflict(OnConflict::new([]));
            let error = POSTGRES.render(&bulk.clone().into()).unwrap_err();
            assert!(format!("{:#}", error).contains("no conflict columns"));
            let targeted = bulk.on_conflict(OnConflict::new([code.clone()]));
            assert_eq!(
                render(&POSTGRES, targeted).sql,
                "INSERT INTO \"keyless\" (\"code\") VALUES\n(?)\nON CONFLICT (\"code\") DO NOTHING"
            );
        }
    }

    #[test]
    fn modified_table_loses_alias() {
        let table = employees().aliased("x");
        let (id, name) = (column(&table, "id"), column(&table, "name"));
        let update = Update::new(&table)
            .set(&name, "Grace")
            .unwrap()
            .filter(id.clone().equal(1).unwrap())
            .unwrap();
        let query = render(&ANSI, update);
        assert_eq!(
            query.sql,
            indoc! {r#"
                UPDATE "employee"
                SET "name" = ?
                WHERE "id" = ?
            "#}
            .trim()
        );
        assert_eq!(
            query.params,
            [Value::Varchar(Some("Grace".into())), Value::Int32(Some(1))]
        );
        let delete = Delete::new(&table).filter(id.equal(1).unwrap()).unwrap();
        assert_eq!(
            render(&SQL_SERVER, delete).sql,
            indoc! {"
                DELETE FROM [employee]
                WHERE [id] = ?
            "}
            .trim()
        );
    }

    #[test]
    fn casts() {
        let table = employees();
        let select = || {
            Select::new(&table).labeled(column(&table, "id").cast(Value::Varchar(None)), "text")
        };
        assert_eq!(
            render(&ANSI, select()).sql,
            "SELECT CAST(\"employee\".\"id\" AS VARCHAR) AS \"text\"\nFROM \"employee\""
        );
        assert_eq!(
            render(&POSTGRES, select()).sql,
            "SELECT CAST(\"employee\".\"id\" AS TEXT) AS \"text\"\nFROM \"employee\""
        );
        assert_eq!(
            render(&MYSQL, select()).sql,
            "SELECT CAST(`employee`.`id` AS CHAR) AS `text`\nFROM `employee`"
        );
        assert_eq!(
            render(&ORACLE, select()).sql,
            "SELECT CAST(\"EMPLOYEE\".\"ID\" AS VARCHAR2(4000)) AS \"TEXT\"\nFROM \"EMPLOYEE\""
        );
        assert_eq!(
            render(&SQL_SERVER, select()).sql,
            "SELECT CAST([employee].[id] AS NVARCHAR(MAX)) AS [text]\nFROM [employee]"
        );
    }

    #[test]
    fn duplicate_alias() {
        let (a, b) = (employees(), employees());
        let source = Source::from(&a)
            .inner_join(&b, column(&a, "id").equal(column(&b, "id")).unwrap())
            .unwrap();
        assert!(matches!(
            render_error(&ANSI, Select::new(source)),
            TillerError::DuplicateAlias(alias) if alias == "employee"
        ));
        let (e, m) = (employees().aliased("e"), departments().aliased("e"));
        let source = Source::from(&e).cross_join(&m).unwrap();
        assert!(matches!(
            render_error(&POSTGRES, Select::new(source)),
            TillerError::DuplicateAlias(alias) if alias == "e"
        ));
    }

    #[test]
    fn identifier_too_long() {
        let table = Table::builder("employee")
            .column("a_really_long_column_name", Value::Int32(None))
            .build()
            .unwrap();
        let select = || Select::new(&table);
        let TillerError::IdentifierTooLong {
            dialect,
            identifier,
            length,
            limit,
        } = render_error(&ORACLE, select())
        else {
            panic!("Expected IdentifierTooLong");
        };
        assert_eq!(dialect, "Oracle");
        assert_eq!(identifier, "employee_a_really_long_column_name");
        assert_eq!(length, 34);
        assert_eq!(limit, 30);
        // Fits everywhere else
        assert!(ANSI.render(&select().into()).is_ok());
        assert!(MYSQL.render(&select().into()).is_ok());

        let long = "x".repeat(64);
        let table = Table::builder(long.clone())
            .column("id", Value::Int32(None))
            .build()
            .unwrap();
        assert!(matches!(
            render_error(&POSTGRES, Delete::new(&table)),
            TillerError::IdentifierTooLong { limit: 63, .. }
        ));
        assert_eq!(
            render(&MYSQL, Delete::new(&table)).sql,
            format!("DELETE FROM `{}`", long)
        );
    }

    #[test]
    fn unsupported_joins() {
        let (e, d) = (employees(), departments());
        let on = || column(&e, "id").equal(column(&d, "id")).unwrap();
        let full = Select::new(Source::from(&e).full_join(&d, on()).unwrap());
        assert!(matches!(
            render_error(&MYSQL, full.clone()),
            TillerError::Unsupported { feature, .. } if feature == "FULL OUTER JOIN"
        ));
        assert!(render(&SQL_SERVER, full).sql.contains(" FULL OUTER JOIN "));

        let natural = Select::new(Source::from(&e).natural_join(&d).unwrap());
        assert!(matches!(
            render_error(&SQL_SERVER, natural.clone()),
            TillerError::Unsupported { feature, .. } if feature == "NATURAL JOIN"
        ));
        assert_eq!(
            render(&ANSI, natural).sql.lines().nth(1),
            Some(r#"FROM "employee" NATURAL JOIN "department""#)
        );
    }

    #[test]
    fn join_on_requires_a_predicate() {
        let (e, d) = (employees(), departments());
        let error = Source::from(&e)
            .inner_join(&d, column(&e, "id").into())
            .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<TillerError>(),
            Some(TillerError::TypeMismatch { .. })
        ));
    }
}
