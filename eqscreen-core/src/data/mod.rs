//! Tabular ingestion (CSV / Parquet) into the screening dataset model.

pub mod ingest;

pub use ingest::{
    fundamentals_from_frame, history_from_frame, prices_from_frame, read_table, IngestError,
};
