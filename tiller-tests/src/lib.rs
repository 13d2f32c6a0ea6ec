mod codecs;
mod mutations;
mod queries;
mod references;
mod schema;
mod tracking;

pub use schema::*;

use crate::{
    codecs::codecs,
    mutations::{bulk, insert_delete, upsert},
    queries::{pagination, queries},
    references::references,
    tracking::{tracking, unflushed},
};
use log::LevelFilter;
use std::env;
use tiller::Connection;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<C: Connection>(mut connection: C) {
    references(&mut connection).await;
    tracking(&mut connection).await;
    unflushed(&mut connection).await;
    insert_delete(&mut connection).await;
    bulk(&mut connection).await;
    upsert(&mut connection).await;
    pagination(&mut connection).await;
    queries(&mut connection).await;
    codecs(&mut connection).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
