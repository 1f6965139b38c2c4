pub mod models;
pub mod query_builder;
pub mod query_tools;

/// Optional logging setup for hosts that have no logger of their own.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_module("visual_sql", log::LevelFilter::Debug)
        .try_init();
}
