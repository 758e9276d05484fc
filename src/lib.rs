//! Writes a fully resolved runtime graph back into a TFLite flatbuffer model.
//!
//! The graph snapshot lives in [`ir`], the writer in [`exporter`] and a
//! verifying decoder for produced artifacts in [`loader`].

pub mod exporter;
pub mod ir;
pub mod loader;
pub mod schema;

pub use exporter::{ExporterError, ModelExporter, TfLiteWriter, WriterConfig};
pub use ir::RuntimeGraph;
pub use loader::{LoadedModel, LoaderError, ModelLoader, TfLiteLoader};
