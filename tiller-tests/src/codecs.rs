use futures::TryStreamExt;
use rust_decimal::Decimal;
use std::{str::FromStr, sync::LazyLock};
use tiller::{Executor, ExprBuilder, Query, Record, Select, Table, Value, materialize};
use time::macros::{date, datetime, time};
use uuid::Uuid;

static SAMPLES: LazyLock<Table> = LazyLock::new(|| {
    let mut builder = Table::builder("t_sample").entity("Sample");
    for (name, value_type) in [
        ("id", Value::Int64(None)),
        ("flag", Value::Boolean(None)),
        ("tiny", Value::Int8(None)),
        ("small", Value::Int16(None)),
        ("regular", Value::Int32(None)),
        ("big", Value::Int64(None)),
        ("single", Value::Float32(None)),
        ("double", Value::Float64(None)),
        ("amount", Value::Decimal(None)),
        ("label", Value::Varchar(None)),
        ("payload", Value::Blob(None)),
        ("day", Value::Date(None)),
        ("moment", Value::Time(None)),
        ("stamp", Value::Timestamp(None)),
        ("zoned", Value::TimestampWithTimezone(None)),
        ("token", Value::Uuid(None)),
    ] {
        builder = builder.column(name, value_type);
        if name == "id" {
            builder = builder.primary_key();
        }
        builder = builder.bind_to(name);
    }
    builder.build().expect("Invalid sample table")
});

fn sample(id: i64) -> Record {
    let record = Record::new("Sample");
    record.set("id", id);
    record.set("flag", true);
    record.set("tiny", i8::MIN);
    record.set("small", i16::MAX);
    record.set("regular", -2_147_483_648i32);
    record.set("big", i64::MAX);
    record.set("single", 3.25f32);
    record.set("double", 0.1f64 + 0.2f64);
    record.set(
        "amount",
        Decimal::from_str("-123456789.123456789").expect("Invalid decimal"),
    );
    record.set("label", "l'été \"quoted\" 🦀");
    record.set("payload", vec![0u8, 1, 2, 255, 0]);
    record.set("day", date!(1999 - 12 - 31));
    record.set("moment", time!(23:59:59.999999999));
    record.set("stamp", datetime!(2025-03-04 05:06:07.123456789));
    record.set("zoned", datetime!(2025-03-04 05:06:07.5 +02:00));
    record.set("token", Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8));
    record
}

pub async fn codecs<E: Executor>(executor: &mut E) {
    let table = SAMPLES.clone();
    for sql in [
        "DROP TABLE IF EXISTS t_sample",
        "CREATE TABLE t_sample (id INTEGER PRIMARY KEY, flag BOOLEAN, tiny SMALLINT, small SMALLINT, regular INTEGER, big BIGINT, single REAL, double REAL, amount TEXT, label TEXT, payload BLOB, day TEXT, moment TEXT, stamp TEXT, zoned TEXT, token TEXT)",
    ] {
        executor
            .execute(Query::new(sql))
            .await
            .expect("Failed to create the sample table");
    }

    let stored = sample(1);
    stored
        .insert(executor, &table)
        .await
        .expect("Failed to insert the sample");
    let rows: Vec<_> = table
        .select_entities(false)
        .unwrap()
        .fetch(executor)
        .try_collect()
        .await
        .expect("Failed to fetch the samples");
    assert_eq!(rows.len(), 1);
    let loaded = materialize(&rows[0], &table, false).expect("Failed to materialize the sample");
    for property in stored.property_names() {
        assert_eq!(
            loaded.value(&property),
            stored.value(&property),
            "Property `{}` did not survive the round trip",
            property
        );
    }
    assert!(loaded == stored);

    // Literals in predicates are encoded like the stored values
    for property in stored.property_names() {
        let column = table.column(&property).unwrap();
        let value = stored.value(&property).unwrap();
        let select = table
            .select_entities(false)
            .unwrap()
            .filter(column.equal(value).unwrap())
            .unwrap();
        let found: Vec<_> = select.fetch(executor).try_collect().await.unwrap();
        assert_eq!(found.len(), 1, "No sample matches on `{}`", property);
    }

    // Nulls of every type
    let empty = Record::new("Sample");
    empty.set("id", 2i64);
    for column in table.all_columns().skip(1) {
        empty.set_null(column.name());
    }
    empty.insert(executor, &table).await.unwrap();
    let rows: Vec<_> = select_by_id(&table, 2)
        .fetch(executor)
        .try_collect()
        .await
        .unwrap();
    let loaded = materialize(&rows[0], &table, false).unwrap();
    for column in table.all_columns().skip(1) {
        let value = loaded.value(column.name()).unwrap();
        assert!(value.is_null());
        assert!(value.same_type(&column.value_type()));
    }
    assert_eq!(loaded.get::<String>("label").unwrap(), "");

    // Floats keep every bit
    let precise = Record::new("Sample");
    precise.set("id", 3i64);
    precise.set("double", f64::MIN_POSITIVE);
    precise.set("single", f32::MAX);
    precise.insert(executor, &table).await.unwrap();
    let rows: Vec<_> = select_by_id(&table, 3)
        .fetch(executor)
        .try_collect()
        .await
        .unwrap();
    let loaded = materialize(&rows[0], &table, false).unwrap();
    assert_eq!(loaded.get::<f64>("double").unwrap(), f64::MIN_POSITIVE);
    assert_eq!(loaded.get::<f32>("single").unwrap(), f32::MAX);
}

fn select_by_id(table: &Table, id: i64) -> Select {
    table
        .select_entities(false)
        .unwrap()
        .filter(table.column("id").unwrap().equal(id).unwrap())
        .unwrap()
}
