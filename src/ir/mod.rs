use crate::exporter::ExporterError;
use crate::schema::{activation, padding, tensor_type, OPTIONAL_TENSOR};

/// Reference to a tensor from an operator or graph I/O list.
///
/// `None` is an optional input that is not present. It is written as `-1`.
pub type TensorRef = Option<usize>;

/// Converts a sentinel encoded id list (`-1` = absent) into tensor refs.
///
/// Any other negative id is rejected.
pub fn refs_from_raw(raw: &[i32]) -> Result<Vec<TensorRef>, ExporterError> {
    raw.iter()
        .map(|&id| match id {
            OPTIONAL_TENSOR => Ok(None),
            id if id >= 0 => Ok(Some(id as usize)),
            id => Err(ExporterError::InvalidArgument(format!("Negative tensor id {}", id))),
        })
        .collect()
}

/// Inverse of [`refs_from_raw`].
pub fn refs_to_raw(refs: &[TensorRef]) -> Vec<i32> {
    refs.iter()
        .map(|r| r.map_or(OPTIONAL_TENSOR, |id| id as i32))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementType {
    #[default]
    NoType,
    Float32,
    Int32,
    UInt8,
    Int64,
    String,
    Bool,
    Int16,
    Complex64,
    Int8,
    Float16,
    Float64,
}

impl ElementType {
    /// Schema `TensorType` code. Untyped tensors are written as FLOAT32.
    pub fn schema_type(self) -> i8 {
        match self {
            ElementType::NoType | ElementType::Float32 => tensor_type::FLOAT32,
            ElementType::Int32 => tensor_type::INT32,
            ElementType::UInt8 => tensor_type::UINT8,
            ElementType::Int64 => tensor_type::INT64,
            ElementType::String => tensor_type::STRING,
            ElementType::Bool => tensor_type::BOOL,
            ElementType::Int16 => tensor_type::INT16,
            ElementType::Complex64 => tensor_type::COMPLEX64,
            ElementType::Int8 => tensor_type::INT8,
            ElementType::Float16 => tensor_type::FLOAT16,
            ElementType::Float64 => tensor_type::FLOAT64,
        }
    }

    pub fn from_schema_type(code: i8) -> Option<Self> {
        Some(match code {
            tensor_type::FLOAT32 => ElementType::Float32,
            tensor_type::FLOAT16 => ElementType::Float16,
            tensor_type::INT32 => ElementType::Int32,
            tensor_type::UINT8 => ElementType::UInt8,
            tensor_type::INT64 => ElementType::Int64,
            tensor_type::STRING => ElementType::String,
            tensor_type::BOOL => ElementType::Bool,
            tensor_type::INT16 => ElementType::Int16,
            tensor_type::COMPLEX64 => ElementType::Complex64,
            tensor_type::INT8 => ElementType::Int8,
            tensor_type::FLOAT64 => ElementType::Float64,
            _ => return None,
        })
    }
}

/// Where the runtime placed a tensor's storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationKind {
    #[default]
    ArenaRw,
    /// Read-only constant data, persisted as a buffer.
    MmapRo,
    ArenaRwPersistent,
    Dynamic,
    Custom,
}

impl AllocationKind {
    /// Only arena and memory-mapped tensors have a serialized form.
    pub fn is_exportable(self) -> bool {
        matches!(
            self,
            AllocationKind::ArenaRw | AllocationKind::MmapRo | AllocationKind::ArenaRwPersistent
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Quantization {
    #[default]
    None,
    /// Single scale and zero point for the whole tensor.
    Affine { scale: f32, zero_point: i32 },
    PerChannel {
        scales: Vec<f32>,
        zero_points: Vec<i64>,
        quantized_dimension: i32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeTensor {
    pub name: String,
    pub element_type: ElementType,
    pub shape: Vec<i32>,
    pub allocation: AllocationKind,
    /// Constant contents. Only read for [`AllocationKind::MmapRo`] tensors.
    pub data: Option<Vec<u8>>,
    pub quantization: Quantization,
    pub is_variable: bool,
}

impl RuntimeTensor {
    pub fn new(name: &str, element_type: ElementType, shape: Vec<i32>) -> Self {
        Self {
            name: name.to_string(),
            element_type,
            shape,
            ..Default::default()
        }
    }

    pub fn constant(name: &str, element_type: ElementType, shape: Vec<i32>, data: Vec<u8>) -> Self {
        Self {
            allocation: AllocationKind::MmapRo,
            data: Some(data),
            ..Self::new(name, element_type, shape)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    #[default]
    Same,
    Valid,
}

impl Padding {
    pub fn code(self) -> i8 {
        match self {
            Padding::Same => padding::SAME,
            Padding::Valid => padding::VALID,
        }
    }

    pub fn from_code(code: i8) -> Self {
        if code == padding::VALID {
            Padding::Valid
        } else {
            Padding::Same
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    None,
    Relu,
    ReluN1To1,
    Relu6,
    Tanh,
    SignBit,
}

impl Activation {
    pub fn code(self) -> i8 {
        match self {
            Activation::None => activation::NONE,
            Activation::Relu => activation::RELU,
            Activation::ReluN1To1 => activation::RELU_N1_TO_1,
            Activation::Relu6 => activation::RELU6,
            Activation::Tanh => activation::TANH,
            Activation::SignBit => activation::SIGN_BIT,
        }
    }

    pub fn from_code(code: i8) -> Self {
        match code {
            activation::RELU => Activation::Relu,
            activation::RELU_N1_TO_1 => Activation::ReluN1To1,
            activation::RELU6 => Activation::Relu6,
            activation::TANH => Activation::Tanh,
            activation::SIGN_BIT => Activation::SignBit,
            _ => Activation::None,
        }
    }
}

/// Parameter block attached to a builtin operator by the kernel registry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BuiltinParams {
    #[default]
    None,
    Conv2D {
        padding: Padding,
        stride_w: i32,
        stride_h: i32,
        activation: Activation,
        dilation_w: i32,
        dilation_h: i32,
    },
    DepthwiseConv2D {
        padding: Padding,
        stride_w: i32,
        stride_h: i32,
        depth_multiplier: i32,
        activation: Activation,
        dilation_w: i32,
        dilation_h: i32,
    },
    /// Shared by the average, max and L2 pooling kernels.
    Pool2D {
        padding: Padding,
        stride_w: i32,
        stride_h: i32,
        filter_width: i32,
        filter_height: i32,
        activation: Activation,
    },
    FullyConnected {
        activation: Activation,
        keep_num_dims: bool,
    },
    Softmax {
        beta: f32,
    },
    Concatenation {
        axis: i32,
        activation: Activation,
    },
    /// Add, Sub, Mul and Div only carry a fused activation.
    Arithmetic {
        activation: Activation,
    },
    Reshape {
        new_shape: Vec<i32>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorKind {
    Builtin { code: i32, params: BuiltinParams },
    Custom { name: String, initial_data: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct RuntimeOperator {
    pub kind: OperatorKind,
    pub inputs: Vec<TensorRef>,
    pub outputs: Vec<TensorRef>,
    /// Scratch tensors owned by the kernel. Never exported.
    pub temporaries: Vec<usize>,
}

impl RuntimeOperator {
    pub fn builtin(code: i32, params: BuiltinParams, inputs: &[usize], outputs: &[usize]) -> Self {
        Self {
            kind: OperatorKind::Builtin { code, params },
            inputs: inputs.iter().copied().map(Some).collect(),
            outputs: outputs.iter().copied().map(Some).collect(),
            temporaries: Vec::new(),
        }
    }

    pub fn custom(name: &str, initial_data: Vec<u8>, inputs: &[usize], outputs: &[usize]) -> Self {
        Self {
            kind: OperatorKind::Custom {
                name: name.to_string(),
                initial_data,
            },
            inputs: inputs.iter().copied().map(Some).collect(),
            outputs: outputs.iter().copied().map(Some).collect(),
            temporaries: Vec::new(),
        }
    }
}

/// Read-only snapshot of an interpreter's primary subgraph.
#[derive(Debug, Clone)]
pub struct RuntimeGraph {
    pub tensors: Vec<RuntimeTensor>,
    pub nodes: Vec<RuntimeOperator>,
    /// Node indices in evaluation order.
    pub execution_plan: Vec<usize>,
    pub inputs: Vec<TensorRef>,
    pub outputs: Vec<TensorRef>,
}

impl RuntimeGraph {
    pub fn new() -> Self {
        Self {
            tensors: Vec::new(),
            nodes: Vec::new(),
            execution_plan: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn add_tensor(&mut self, tensor: RuntimeTensor) -> usize {
        self.tensors.push(tensor);
        self.tensors.len() - 1
    }

    /// Appends a node and schedules it at the end of the execution plan.
    pub fn add_node(&mut self, node: RuntimeOperator) -> usize {
        self.nodes.push(node);
        let index = self.nodes.len() - 1;
        self.execution_plan.push(index);
        index
    }
}

impl Default for RuntimeGraph {
    fn default() -> Self {
        Self::new()
    }
}
