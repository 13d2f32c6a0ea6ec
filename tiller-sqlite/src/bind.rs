use crate::{CBox, error_message_from_ptr};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, c_int},
    os::raw::{c_char, c_void},
};
use time::{format_description::well_known::Rfc3339, macros::format_description};
use tiller_core::{Error, Result, Value, truncate_long};

/// Text stored for the types SQLite has no storage class for.
fn as_text(value: &Value) -> Result<Option<String>> {
    Ok(match value {
        Value::Decimal(Some(v)) => Some(v.to_string()),
        Value::Date(Some(v)) => Some(v.format(format_description!("[year]-[month]-[day]"))?),
        Value::Time(Some(v)) => Some(v.format(format_description!(
            "[hour]:[minute]:[second].[subsecond digits:9]"
        ))?),
        Value::Timestamp(Some(v)) => Some(v.format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:9]"
        ))?),
        Value::TimestampWithTimezone(Some(v)) => Some(v.format(&Rfc3339)?),
        Value::Uuid(Some(v)) => Some(v.to_string()),
        _ => None,
    })
}

/// Bind `value` to the 1 based parameter `index` of the statement.
pub(crate) fn bind_value(
    statement: &CBox<*mut sqlite3_stmt>,
    index: c_int,
    value: &Value,
) -> Result<()> {
    unsafe {
        let rc = match value {
            v if v.is_null() => sqlite3_bind_null(**statement, index),
            Value::Boolean(Some(v)) => sqlite3_bind_int64(**statement, index, *v as i64),
            Value::Int8(Some(v)) => sqlite3_bind_int64(**statement, index, *v as i64),
            Value::Int16(Some(v)) => sqlite3_bind_int64(**statement, index, *v as i64),
            Value::Int32(Some(v)) => sqlite3_bind_int64(**statement, index, *v as i64),
            Value::Int64(Some(v)) => sqlite3_bind_int64(**statement, index, *v),
            Value::Float32(Some(v)) => sqlite3_bind_double(**statement, index, *v as f64),
            Value::Float64(Some(v)) => sqlite3_bind_double(**statement, index, *v),
            Value::Varchar(Some(v)) => sqlite3_bind_text(
                **statement,
                index,
                v.as_ptr() as *const c_char,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            Value::Blob(Some(v)) => sqlite3_bind_blob(
                **statement,
                index,
                v.as_ptr() as *const c_void,
                v.len() as c_int,
                SQLITE_TRANSIENT(),
            ),
            v => match as_text(v)? {
                Some(text) => sqlite3_bind_text(
                    **statement,
                    index,
                    text.as_ptr() as *const c_char,
                    text.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                None => {
                    let error = Error::msg(format!("Cannot use a {:?} as a query parameter", v));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            },
        };
        if rc != SQLITE_OK {
            let db = sqlite3_db_handle(**statement);
            let query = CStr::from_ptr(sqlite3_sql(**statement)).to_string_lossy();
            let error = Error::msg(error_message_from_ptr(&sqlite3_errmsg(db)).to_string())
                .context(format!(
                    "Cannot bind parameter {} to query:\n{}",
                    index,
                    truncate_long!(query)
                ));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::as_text;
    use time::macros::{date, datetime, time};
    use tiller_core::Value;

    #[test]
    fn temporal_values_keep_nanoseconds() {
        assert_eq!(
            as_text(&Value::Timestamp(Some(datetime!(2025-03-04 05:06:07.123456789))))
                .unwrap()
                .as_deref(),
            Some("2025-03-04 05:06:07.123456789")
        );
        assert_eq!(
            as_text(&Value::Time(Some(time!(23:59:01)))).unwrap().as_deref(),
            Some("23:59:01.000000000")
        );
        assert_eq!(
            as_text(&Value::Date(Some(date!(1999-12-31)))).unwrap().as_deref(),
            Some("1999-12-31")
        );
        assert_eq!(as_text(&Value::Int32(Some(1))).unwrap(), None);
    }
}
