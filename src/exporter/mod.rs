pub mod buffers;
pub mod custom;
pub mod opcodes;
pub mod operators;
pub mod options;
pub mod tensors;
pub mod tflite_writer;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flatbuffers::{ForwardsUOffset, TableFinishedWIPOffset, Vector, WIPOffset};
use thiserror::Error;

pub use custom::{CustomOptionsFormat, CustomWriter, CustomWriterRegistry};
pub use options::{BuiltinOptionsWriter, OptionsWriter};
pub use tflite_writer::{TfLiteWriter, WriterConfig};

/// Finished vector of tables inside the builder.
pub type TableVector<'fbb> = WIPOffset<Vector<'fbb, ForwardsUOffset<TableFinishedWIPOffset>>>;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Custom writer already registered for `{0}`")]
    DuplicateRegistration(String),
    #[error("Failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to close {path:?}: {source}")]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait ModelExporter {
    /// Serializes the model into a finished, self-contained byte buffer.
    fn produce_buffer(&self) -> Result<Vec<u8>, ExporterError>;

    /// Serializes the model and persists it at `path`.
    ///
    /// The buffer is fully assembled before the file is created.
    fn write_to_path(&self, path: &Path) -> Result<(), ExporterError> {
        let buffer = self.produce_buffer()?;
        write_model_file(path, &buffer)
    }
}

pub(crate) fn write_model_file(path: &Path, buffer: &[u8]) -> Result<(), ExporterError> {
    let file = File::create(path).map_err(|source| ExporterError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    // Dropping a File swallows close errors, so surface them through sync_all.
    write_and_close(file, path, buffer, |file| file.sync_all())?;

    log::info!("Wrote {} bytes to {:?}", buffer.len(), path);
    Ok(())
}

fn write_and_close<W, C>(mut out: W, path: &Path, buffer: &[u8], close: C) -> Result<(), ExporterError>
where
    W: Write,
    C: FnOnce(W) -> io::Result<()>,
{
    out.write_all(buffer).map_err(|source| ExporterError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    close(out).map_err(|source| ExporterError::Close {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FixedExporter(Vec<u8>);

    impl ModelExporter for FixedExporter {
        fn produce_buffer(&self) -> Result<Vec<u8>, ExporterError> {
            Ok(self.0.clone())
        }
    }

    struct FailingExporter;

    impl ModelExporter for FailingExporter {
        fn produce_buffer(&self) -> Result<Vec<u8>, ExporterError> {
            Err(ExporterError::InvalidArgument("no graph".to_string()))
        }
    }

    #[test]
    fn test_write_to_path_persists_buffer() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("model.tflite");

        FixedExporter(vec![1, 2, 3, 4]).write_to_path(&file_path).unwrap();

        assert_eq!(std::fs::read(&file_path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing").join("model.tflite");

        let result = FixedExporter(vec![0]).write_to_path(&file_path);

        assert!(matches!(result, Err(ExporterError::Open { .. })));
        assert!(!file_path.exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_is_reported() {
        let result = FixedExporter(vec![0; 64]).write_to_path(Path::new("/dev/full"));

        assert!(matches!(result, Err(ExporterError::Write { .. })));
    }

    #[test]
    fn test_close_failure_is_reported() {
        let mut written = Vec::new();

        let result = write_and_close(&mut written, Path::new("model.tflite"), &[1, 2], |_| {
            Err(io::Error::new(io::ErrorKind::Other, "disk gone"))
        });

        assert!(matches!(result, Err(ExporterError::Close { .. })));
        assert_eq!(written, vec![1, 2]);
    }

    #[test]
    fn test_close_is_skipped_after_write_failure() {
        struct BrokenSink;

        impl Write for BrokenSink {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "broken"))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut closed = false;
        let result = write_and_close(BrokenSink, Path::new("model.tflite"), &[1], |_| {
            closed = true;
            Ok(())
        });

        assert!(matches!(result, Err(ExporterError::Write { .. })));
        assert!(!closed);
    }

    #[test]
    fn test_failed_export_never_creates_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("model.tflite");

        let result = FailingExporter.write_to_path(&file_path);

        assert!(matches!(result, Err(ExporterError::InvalidArgument(_))));
        assert!(!file_path.exists());
    }
}
