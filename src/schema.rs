//! Constants of the TFLite flatbuffer schema (version 3).
//!
//! Tables are built by hand with the `flatbuffers` builder, so every field
//! is addressed through its vtable offset (`4 + 2 * field_id`).

/// File identifier stored at bytes 4..8 of every model.
pub const FILE_IDENTIFIER: &str = "TFL3";

/// Schema version written into the root table.
pub const SCHEMA_VERSION: u32 = 3;

/// Description string attached to exported models.
pub const DEFAULT_DESCRIPTION: &str = "Exported from Interpreter.";

/// Serialized marker for an optional tensor that is not present.
pub const OPTIONAL_TENSOR: i32 = -1;

/// Buffer index meaning "no data".
pub const EMPTY_BUFFER: u32 = 0;

pub mod builtin_op {
    pub const ADD: i32 = 0;
    pub const AVERAGE_POOL_2D: i32 = 1;
    pub const CONCATENATION: i32 = 2;
    pub const CONV_2D: i32 = 3;
    pub const DEPTHWISE_CONV_2D: i32 = 4;
    pub const FULLY_CONNECTED: i32 = 9;
    pub const L2_POOL_2D: i32 = 12;
    pub const LOGISTIC: i32 = 14;
    pub const MAX_POOL_2D: i32 = 17;
    pub const MUL: i32 = 18;
    pub const RELU: i32 = 19;
    pub const RESHAPE: i32 = 22;
    pub const SOFTMAX: i32 = 25;
    pub const TANH: i32 = 28;
    pub const CUSTOM: i32 = 32;
    pub const SUB: i32 = 41;
    pub const DIV: i32 = 42;
    /// Largest code representable in the deprecated byte field.
    pub const PLACEHOLDER_FOR_GREATER_OP_CODES: i32 = 127;
}

pub mod builtin_options {
    pub const NONE: u8 = 0;
    pub const CONV_2D: u8 = 1;
    pub const DEPTHWISE_CONV_2D: u8 = 2;
    pub const POOL_2D: u8 = 5;
    pub const FULLY_CONNECTED: u8 = 8;
    pub const SOFTMAX: u8 = 9;
    pub const CONCATENATION: u8 = 10;
    pub const ADD: u8 = 11;
    pub const RESHAPE: u8 = 17;
    pub const MUL: u8 = 21;
    pub const SUB: u8 = 28;
    pub const DIV: u8 = 29;
}

pub mod tensor_type {
    pub const FLOAT32: i8 = 0;
    pub const FLOAT16: i8 = 1;
    pub const INT32: i8 = 2;
    pub const UINT8: i8 = 3;
    pub const INT64: i8 = 4;
    pub const STRING: i8 = 5;
    pub const BOOL: i8 = 6;
    pub const INT16: i8 = 7;
    pub const COMPLEX64: i8 = 8;
    pub const INT8: i8 = 9;
    pub const FLOAT64: i8 = 10;
}

pub mod padding {
    pub const SAME: i8 = 0;
    pub const VALID: i8 = 1;
}

pub mod activation {
    pub const NONE: i8 = 0;
    pub const RELU: i8 = 1;
    pub const RELU_N1_TO_1: i8 = 2;
    pub const RELU6: i8 = 3;
    pub const TANH: i8 = 4;
    pub const SIGN_BIT: i8 = 5;
}

pub mod custom_options_format {
    pub const FLEXBUFFERS: i8 = 0;
}

/// Vtable offsets, one module per table.
pub mod vt {
    use flatbuffers::VOffsetT;

    pub mod model {
        use super::VOffsetT;
        pub const VERSION: VOffsetT = 4;
        pub const OPERATOR_CODES: VOffsetT = 6;
        pub const SUBGRAPHS: VOffsetT = 8;
        pub const DESCRIPTION: VOffsetT = 10;
        pub const BUFFERS: VOffsetT = 12;
    }

    pub mod operator_code {
        use super::VOffsetT;
        pub const DEPRECATED_BUILTIN_CODE: VOffsetT = 4;
        pub const CUSTOM_CODE: VOffsetT = 6;
        pub const VERSION: VOffsetT = 8;
        pub const BUILTIN_CODE: VOffsetT = 10;
    }

    pub mod sub_graph {
        use super::VOffsetT;
        pub const TENSORS: VOffsetT = 4;
        pub const INPUTS: VOffsetT = 6;
        pub const OUTPUTS: VOffsetT = 8;
        pub const OPERATORS: VOffsetT = 10;
        pub const NAME: VOffsetT = 12;
    }

    pub mod tensor {
        use super::VOffsetT;
        pub const SHAPE: VOffsetT = 4;
        pub const TYPE: VOffsetT = 6;
        pub const BUFFER: VOffsetT = 8;
        pub const NAME: VOffsetT = 10;
        pub const QUANTIZATION: VOffsetT = 12;
        pub const IS_VARIABLE: VOffsetT = 14;
    }

    pub mod quantization {
        use super::VOffsetT;
        pub const SCALE: VOffsetT = 8;
        pub const ZERO_POINT: VOffsetT = 10;
        pub const QUANTIZED_DIMENSION: VOffsetT = 16;
    }

    pub mod operator {
        use super::VOffsetT;
        pub const OPCODE_INDEX: VOffsetT = 4;
        pub const INPUTS: VOffsetT = 6;
        pub const OUTPUTS: VOffsetT = 8;
        pub const BUILTIN_OPTIONS_TYPE: VOffsetT = 10;
        pub const BUILTIN_OPTIONS: VOffsetT = 12;
        pub const CUSTOM_OPTIONS: VOffsetT = 14;
        pub const CUSTOM_OPTIONS_FORMAT: VOffsetT = 16;
    }

    pub mod buffer {
        use super::VOffsetT;
        pub const DATA: VOffsetT = 4;
    }

    pub mod conv_2d_options {
        use super::VOffsetT;
        pub const PADDING: VOffsetT = 4;
        pub const STRIDE_W: VOffsetT = 6;
        pub const STRIDE_H: VOffsetT = 8;
        pub const FUSED_ACTIVATION_FUNCTION: VOffsetT = 10;
        pub const DILATION_W_FACTOR: VOffsetT = 12;
        pub const DILATION_H_FACTOR: VOffsetT = 14;
    }

    pub mod depthwise_conv_2d_options {
        use super::VOffsetT;
        pub const PADDING: VOffsetT = 4;
        pub const STRIDE_W: VOffsetT = 6;
        pub const STRIDE_H: VOffsetT = 8;
        pub const DEPTH_MULTIPLIER: VOffsetT = 10;
        pub const FUSED_ACTIVATION_FUNCTION: VOffsetT = 12;
        pub const DILATION_W_FACTOR: VOffsetT = 14;
        pub const DILATION_H_FACTOR: VOffsetT = 16;
    }

    pub mod pool_2d_options {
        use super::VOffsetT;
        pub const PADDING: VOffsetT = 4;
        pub const STRIDE_W: VOffsetT = 6;
        pub const STRIDE_H: VOffsetT = 8;
        pub const FILTER_WIDTH: VOffsetT = 10;
        pub const FILTER_HEIGHT: VOffsetT = 12;
        pub const FUSED_ACTIVATION_FUNCTION: VOffsetT = 14;
    }

    pub mod fully_connected_options {
        use super::VOffsetT;
        pub const FUSED_ACTIVATION_FUNCTION: VOffsetT = 4;
        pub const KEEP_NUM_DIMS: VOffsetT = 8;
    }

    pub mod softmax_options {
        use super::VOffsetT;
        pub const BETA: VOffsetT = 4;
    }

    pub mod concatenation_options {
        use super::VOffsetT;
        pub const AXIS: VOffsetT = 4;
        pub const FUSED_ACTIVATION_FUNCTION: VOffsetT = 6;
    }

    /// Shared by the Add, Sub, Mul and Div options tables.
    pub mod arithmetic_options {
        use super::VOffsetT;
        pub const FUSED_ACTIVATION_FUNCTION: VOffsetT = 4;
    }

    pub mod reshape_options {
        use super::VOffsetT;
        pub const NEW_SHAPE: VOffsetT = 4;
    }
}
