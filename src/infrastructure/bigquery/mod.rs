pub mod bq_cli_adapter;
