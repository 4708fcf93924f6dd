mod common;
mod credentials_test;
mod database_source_test;
mod object_storage_test;
mod run_failure_test;
