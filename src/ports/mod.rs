pub mod warehouse_port;
