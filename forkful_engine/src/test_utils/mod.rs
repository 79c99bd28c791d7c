#[cfg(feature = "sqlite")]
pub mod prepare_env;
pub mod rider_path;
