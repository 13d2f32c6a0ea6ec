mod resource {
    pub mod company;
}

#[cfg(test)]
mod tests {
    use crate::resource::company::{departments, employees};
    use tiller::{
        ExprBuilder, GenericSqlWriter, Select, Source, SqlWriter, Statement, Table, Value,
        reference_joins,
    };

    #[test]
    fn aliasing_is_independent() {
        let table = employees();
        let a = table.aliased("a");
        let b = table.aliased("b");
        assert_eq!(table.alias(), None);
        assert_eq!(a.alias(), Some("a"));
        assert_eq!(b.alias(), Some("b"));
        assert_ne!(a, b);
        assert_ne!(a, table);
        assert!(a.same_definition(&b));
        assert_eq!(a.unaliased(), table);
        assert_eq!(a.aliased("c").alias(), Some("c"));
        assert_eq!(a.alias(), Some("a"));

        let (a_id, b_id) = (a.column("id").unwrap(), b.column("id").unwrap());
        assert_eq!(a_id.label(), "a_id");
        assert_eq!(b_id.label(), "b_id");
        assert_eq!(table.column("id").unwrap().label(), "t_employee_id");
        assert_ne!(a_id, b_id);

        let source = Source::from(&a)
            .inner_join(&b, (&a_id).equal(&b_id).unwrap())
            .unwrap();
        let query = GenericSqlWriter::new()
            .render(&Statement::Select(Select::new(source).column(&a_id).column(&b_id)))
            .unwrap();
        assert_eq!(
            query.sql,
            "SELECT \"a\".\"id\" AS \"a_id\", \"b\".\"id\" AS \"b_id\"\nFROM \"t_employee\" \"a\" INNER JOIN \"t_employee\" \"b\" ON \"a\".\"id\" = \"b\".\"id\""
        );
        assert_eq!(table, employees());
    }

    #[test]
    fn reference_plan_skips_cycles() {
        fn nodes() -> Table {
            Table::builder("t_node")
                .column("id", Value::Int64(None))
                .primary_key()
                .bind_to("id")
                .column("parent_id", Value::Int64(None))
                .references("parent", nodes)
                .build()
                .unwrap()
        }
        assert!(reference_joins(&nodes()).unwrap().is_empty());

        let joins = reference_joins(&employees()).unwrap();
        assert_eq!(joins.len(), 1);
        assert_eq!(joins[0].table.alias(), Some("_ref0"));
        assert!(joins[0].table.same_definition(&departments()));
        assert!(joins[0].children.is_empty());
    }
}
