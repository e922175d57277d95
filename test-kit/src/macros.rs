//! -----------------
//! helper test macros
//! -----------------

use std::{env, path::Path};

pub fn init_logger_for_test_path(full_path_to_test_file: &str) {
    // In order to include logs from the test themselves we need to add the
    // name of the test file (minus the extension) to the RUST_LOG filter
    let mut rust_log =
        env::var(env_logger::DEFAULT_FILTER_ENV).unwrap_or_default();
    if rust_log.ends_with(',') || rust_log.is_empty() {
        let test_file = Path::new(full_path_to_test_file)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("tests");
        let test_level =
            env::var("RUST_TEST_LOG").unwrap_or_else(|_| "info".to_string());
        rust_log.push_str(&format!("{test_file}={test_level}"));
        env::set_var(env_logger::DEFAULT_FILTER_ENV, rust_log);
    }

    let _ = env_logger::builder()
        .format_timestamp_micros()
        .is_test(true)
        .try_init();
}

#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::macros::init_logger_for_test_path(::std::file!());
    };
}
