pub mod bigquery;
pub mod local_storage;
