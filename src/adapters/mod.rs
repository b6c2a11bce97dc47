// Adapters layer: concrete implementations for external systems (files, CSV tables, chat http).

pub mod csv_tables;
pub mod openai;
pub mod storage;
