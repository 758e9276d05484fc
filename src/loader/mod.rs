use std::path::Path;
use thiserror::Error;

use crate::ir::{BuiltinParams, ElementType, Quantization};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),
}

pub trait ModelLoader {
    fn load<P: AsRef<Path>>(path: P) -> Result<LoadedModel, LoaderError>;
}

pub mod tflite;

pub use tflite::TfLiteLoader;

/// Owned copy of a decoded model.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub version: u32,
    pub description: Option<String>,
    pub operator_codes: Vec<LoadedOpCode>,
    pub subgraphs: Vec<LoadedSubGraph>,
    pub buffers: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedOpCode {
    pub builtin_code: i32,
    pub custom_code: Option<String>,
    pub version: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSubGraph {
    pub tensors: Vec<LoadedTensor>,
    pub inputs: Vec<i32>,
    pub outputs: Vec<i32>,
    pub operators: Vec<LoadedOperator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTensor {
    pub name: String,
    pub shape: Vec<i32>,
    pub element_type: ElementType,
    pub buffer: u32,
    pub quantization: Quantization,
    pub is_variable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedOperator {
    pub opcode_index: u32,
    pub inputs: Vec<i32>,
    pub outputs: Vec<i32>,
    pub builtin_options_type: u8,
    /// Decoded options. `BuiltinParams::None` for unknown option tables.
    pub builtin_options: BuiltinParams,
    pub custom_options: Option<Vec<u8>>,
    pub custom_options_format: i8,
}
