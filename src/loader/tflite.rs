use std::fs;
use std::path::Path;

use flatbuffers::{Follow, ForwardsUOffset, InvalidFlatbuffer, Table, VOffsetT, Vector, Verifiable, Verifier};

use crate::ir::{Activation, BuiltinParams, ElementType, Padding, Quantization};
use crate::loader::{
    LoadedModel, LoadedOpCode, LoadedOperator, LoadedSubGraph, LoadedTensor, LoaderError, ModelLoader,
};
use crate::schema::{builtin_options, vt, FILE_IDENTIFIER, SCHEMA_VERSION};

/// Declares a read-only view over one table of the schema.
///
/// With a field list, the view also gets a verifier visiting those fields.
macro_rules! table_view {
    ($view:ident) => {
        struct $view<'a> {
            tab: Table<'a>,
        }

        impl<'a> Follow<'a> for $view<'a> {
            type Inner = Self;

            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                Self {
                    tab: unsafe { Table::new(buf, loc) },
                }
            }
        }

        #[allow(dead_code)]
        impl<'a> $view<'a> {
            fn get<T: Follow<'a> + 'a>(&self, slot: VOffsetT, default: Option<T::Inner>) -> Option<T::Inner> {
                // SAFETY: views are only built by `flatbuffers::root`, which
                // verified every field this module reads.
                unsafe { self.tab.get::<T>(slot, default) }
            }

            fn scalar<T>(&self, slot: VOffsetT, default: T) -> T
            where
                T: Follow<'a, Inner = T> + Copy + 'a,
            {
                self.get::<T>(slot, Some(default)).unwrap_or(default)
            }
        }
    };
    ($view:ident { $($name:literal: $ty:ty = $slot:expr),* $(,)? }) => {
        table_view!($view);

        impl Verifiable for $view<'_> {
            fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
                v.visit_table(pos)?
                    $(.visit_field::<$ty>($name, $slot, false)?)*
                    .finish();
                Ok(())
            }
        }
    };
}

table_view!(ModelView {
    "version": u32 = vt::model::VERSION,
    "operator_codes": ForwardsUOffset<Vector<'_, ForwardsUOffset<OperatorCodeView>>> = vt::model::OPERATOR_CODES,
    "subgraphs": ForwardsUOffset<Vector<'_, ForwardsUOffset<SubGraphView>>> = vt::model::SUBGRAPHS,
    "description": ForwardsUOffset<&str> = vt::model::DESCRIPTION,
    "buffers": ForwardsUOffset<Vector<'_, ForwardsUOffset<BufferView>>> = vt::model::BUFFERS,
});

table_view!(OperatorCodeView {
    "deprecated_builtin_code": i8 = vt::operator_code::DEPRECATED_BUILTIN_CODE,
    "custom_code": ForwardsUOffset<&str> = vt::operator_code::CUSTOM_CODE,
    "version": i32 = vt::operator_code::VERSION,
    "builtin_code": i32 = vt::operator_code::BUILTIN_CODE,
});

table_view!(SubGraphView {
    "tensors": ForwardsUOffset<Vector<'_, ForwardsUOffset<TensorView>>> = vt::sub_graph::TENSORS,
    "inputs": ForwardsUOffset<Vector<'_, i32>> = vt::sub_graph::INPUTS,
    "outputs": ForwardsUOffset<Vector<'_, i32>> = vt::sub_graph::OUTPUTS,
    "operators": ForwardsUOffset<Vector<'_, ForwardsUOffset<OperatorView>>> = vt::sub_graph::OPERATORS,
    "name": ForwardsUOffset<&str> = vt::sub_graph::NAME,
});

table_view!(TensorView {
    "shape": ForwardsUOffset<Vector<'_, i32>> = vt::tensor::SHAPE,
    "type": i8 = vt::tensor::TYPE,
    "buffer": u32 = vt::tensor::BUFFER,
    "name": ForwardsUOffset<&str> = vt::tensor::NAME,
    "quantization": ForwardsUOffset<QuantizationView> = vt::tensor::QUANTIZATION,
    "is_variable": bool = vt::tensor::IS_VARIABLE,
});

table_view!(QuantizationView {
    "scale": ForwardsUOffset<Vector<'_, f32>> = vt::quantization::SCALE,
    "zero_point": ForwardsUOffset<Vector<'_, i64>> = vt::quantization::ZERO_POINT,
    "quantized_dimension": i32 = vt::quantization::QUANTIZED_DIMENSION,
});

table_view!(BufferView {
    "data": ForwardsUOffset<Vector<'_, u8>> = vt::buffer::DATA,
});

table_view!(OperatorView);

impl Verifiable for OperatorView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("opcode_index", vt::operator::OPCODE_INDEX, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", vt::operator::INPUTS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("outputs", vt::operator::OUTPUTS, false)?
            .visit_union::<u8, _>(
                "builtin_options_type",
                vt::operator::BUILTIN_OPTIONS_TYPE,
                "builtin_options",
                vt::operator::BUILTIN_OPTIONS,
                false,
                |tag, v, pos| match tag {
                    builtin_options::CONV_2D => {
                        v.verify_union_variant::<ForwardsUOffset<Conv2DOptionsView>>("Conv2DOptions", pos)
                    }
                    builtin_options::DEPTHWISE_CONV_2D => v
                        .verify_union_variant::<ForwardsUOffset<DepthwiseConv2DOptionsView>>(
                            "DepthwiseConv2DOptions",
                            pos,
                        ),
                    builtin_options::POOL_2D => {
                        v.verify_union_variant::<ForwardsUOffset<Pool2DOptionsView>>("Pool2DOptions", pos)
                    }
                    builtin_options::FULLY_CONNECTED => v
                        .verify_union_variant::<ForwardsUOffset<FullyConnectedOptionsView>>(
                            "FullyConnectedOptions",
                            pos,
                        ),
                    builtin_options::SOFTMAX => {
                        v.verify_union_variant::<ForwardsUOffset<SoftmaxOptionsView>>("SoftmaxOptions", pos)
                    }
                    builtin_options::CONCATENATION => v
                        .verify_union_variant::<ForwardsUOffset<ConcatenationOptionsView>>(
                            "ConcatenationOptions",
                            pos,
                        ),
                    builtin_options::ADD
                    | builtin_options::SUB
                    | builtin_options::MUL
                    | builtin_options::DIV => v
                        .verify_union_variant::<ForwardsUOffset<ArithmeticOptionsView>>(
                            "ArithmeticOptions",
                            pos,
                        ),
                    builtin_options::RESHAPE => {
                        v.verify_union_variant::<ForwardsUOffset<ReshapeOptionsView>>("ReshapeOptions", pos)
                    }
                    _ => Ok(()),
                },
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, u8>>>("custom_options", vt::operator::CUSTOM_OPTIONS, false)?
            .visit_field::<i8>("custom_options_format", vt::operator::CUSTOM_OPTIONS_FORMAT, false)?
            .finish();
        Ok(())
    }
}

table_view!(Conv2DOptionsView {
    "padding": i8 = vt::conv_2d_options::PADDING,
    "stride_w": i32 = vt::conv_2d_options::STRIDE_W,
    "stride_h": i32 = vt::conv_2d_options::STRIDE_H,
    "fused_activation_function": i8 = vt::conv_2d_options::FUSED_ACTIVATION_FUNCTION,
    "dilation_w_factor": i32 = vt::conv_2d_options::DILATION_W_FACTOR,
    "dilation_h_factor": i32 = vt::conv_2d_options::DILATION_H_FACTOR,
});

table_view!(DepthwiseConv2DOptionsView {
    "padding": i8 = vt::depthwise_conv_2d_options::PADDING,
    "stride_w": i32 = vt::depthwise_conv_2d_options::STRIDE_W,
    "stride_h": i32 = vt::depthwise_conv_2d_options::STRIDE_H,
    "depth_multiplier": i32 = vt::depthwise_conv_2d_options::DEPTH_MULTIPLIER,
    "fused_activation_function": i8 = vt::depthwise_conv_2d_options::FUSED_ACTIVATION_FUNCTION,
    "dilation_w_factor": i32 = vt::depthwise_conv_2d_options::DILATION_W_FACTOR,
    "dilation_h_factor": i32 = vt::depthwise_conv_2d_options::DILATION_H_FACTOR,
});

table_view!(Pool2DOptionsView {
    "padding": i8 = vt::pool_2d_options::PADDING,
    "stride_w": i32 = vt::pool_2d_options::STRIDE_W,
    "stride_h": i32 = vt::pool_2d_options::STRIDE_H,
    "filter_width": i32 = vt::pool_2d_options::FILTER_WIDTH,
    "filter_height": i32 = vt::pool_2d_options::FILTER_HEIGHT,
    "fused_activation_function": i8 = vt::pool_2d_options::FUSED_ACTIVATION_FUNCTION,
});

table_view!(FullyConnectedOptionsView {
    "fused_activation_function": i8 = vt::fully_connected_options::FUSED_ACTIVATION_FUNCTION,
    "keep_num_dims": bool = vt::fully_connected_options::KEEP_NUM_DIMS,
});

table_view!(SoftmaxOptionsView {
    "beta": f32 = vt::softmax_options::BETA,
});

table_view!(ConcatenationOptionsView {
    "axis": i32 = vt::concatenation_options::AXIS,
    "fused_activation_function": i8 = vt::concatenation_options::FUSED_ACTIVATION_FUNCTION,
});

table_view!(ArithmeticOptionsView {
    "fused_activation_function": i8 = vt::arithmetic_options::FUSED_ACTIVATION_FUNCTION,
});

table_view!(ReshapeOptionsView {
    "new_shape": ForwardsUOffset<Vector<'_, i32>> = vt::reshape_options::NEW_SHAPE,
});

/// Decodes TFLite flatbuffers after running the flatbuffers verifier.
pub struct TfLiteLoader;

impl TfLiteLoader {
    pub fn from_bytes(bytes: &[u8]) -> Result<LoadedModel, LoaderError> {
        if bytes.len() < 8 || !flatbuffers::buffer_has_identifier(bytes, FILE_IDENTIFIER, false) {
            return Err(LoaderError::InvalidFormat(format!(
                "missing {} file identifier",
                FILE_IDENTIFIER
            )));
        }
        let model = flatbuffers::root::<ModelView>(bytes)
            .map_err(|e| LoaderError::InvalidFormat(e.to_string()))?;

        let version = model.scalar::<u32>(vt::model::VERSION, 0);
        if version > SCHEMA_VERSION {
            return Err(LoaderError::UnsupportedVersion(format!(
                "schema version {} is newer than {}",
                version, SCHEMA_VERSION
            )));
        }

        let operator_codes = model
            .get::<ForwardsUOffset<Vector<ForwardsUOffset<OperatorCodeView>>>>(vt::model::OPERATOR_CODES, None)
            .map(|codes| codes.iter().map(|code| decode_opcode(&code)).collect())
            .unwrap_or_default();
        let subgraphs = model
            .get::<ForwardsUOffset<Vector<ForwardsUOffset<SubGraphView>>>>(vt::model::SUBGRAPHS, None)
            .map(|subgraphs| subgraphs.iter().map(|subgraph| decode_subgraph(&subgraph)).collect())
            .unwrap_or_default();
        let buffers = model
            .get::<ForwardsUOffset<Vector<ForwardsUOffset<BufferView>>>>(vt::model::BUFFERS, None)
            .map(|buffers| {
                buffers
                    .iter()
                    .map(|buffer| bytes_of(buffer.get::<ForwardsUOffset<Vector<u8>>>(vt::buffer::DATA, None)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(LoadedModel {
            version,
            description: model
                .get::<ForwardsUOffset<&str>>(vt::model::DESCRIPTION, None)
                .map(str::to_string),
            operator_codes,
            subgraphs,
            buffers,
        })
    }
}

impl ModelLoader for TfLiteLoader {
    fn load<P: AsRef<Path>>(path: P) -> Result<LoadedModel, LoaderError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

fn ints(vector: Option<Vector<'_, i32>>) -> Vec<i32> {
    vector.map(|v| v.iter().collect()).unwrap_or_default()
}

fn bytes_of(vector: Option<Vector<'_, u8>>) -> Vec<u8> {
    vector.map(|v| v.bytes().to_vec()).unwrap_or_default()
}

fn decode_opcode(code: &OperatorCodeView<'_>) -> LoadedOpCode {
    LoadedOpCode {
        builtin_code: code.scalar::<i32>(vt::operator_code::BUILTIN_CODE, 0),
        custom_code: code
            .get::<ForwardsUOffset<&str>>(vt::operator_code::CUSTOM_CODE, None)
            .map(str::to_string),
        version: code.scalar::<i32>(vt::operator_code::VERSION, 1),
    }
}

fn decode_subgraph(subgraph: &SubGraphView<'_>) -> LoadedSubGraph {
    LoadedSubGraph {
        tensors: subgraph
            .get::<ForwardsUOffset<Vector<ForwardsUOffset<TensorView>>>>(vt::sub_graph::TENSORS, None)
            .map(|tensors| tensors.iter().map(|tensor| decode_tensor(&tensor)).collect())
            .unwrap_or_default(),
        inputs: ints(subgraph.get::<ForwardsUOffset<Vector<i32>>>(vt::sub_graph::INPUTS, None)),
        outputs: ints(subgraph.get::<ForwardsUOffset<Vector<i32>>>(vt::sub_graph::OUTPUTS, None)),
        operators: subgraph
            .get::<ForwardsUOffset<Vector<ForwardsUOffset<OperatorView>>>>(vt::sub_graph::OPERATORS, None)
            .map(|operators| operators.iter().map(|op| decode_operator(&op)).collect())
            .unwrap_or_default(),
    }
}

fn decode_tensor(tensor: &TensorView<'_>) -> LoadedTensor {
    let type_code = tensor.scalar::<i8>(vt::tensor::TYPE, 0);
    LoadedTensor {
        name: tensor
            .get::<ForwardsUOffset<&str>>(vt::tensor::NAME, None)
            .unwrap_or_default()
            .to_string(),
        shape: ints(tensor.get::<ForwardsUOffset<Vector<i32>>>(vt::tensor::SHAPE, None)),
        element_type: ElementType::from_schema_type(type_code).unwrap_or_default(),
        buffer: tensor.scalar::<u32>(vt::tensor::BUFFER, 0),
        quantization: tensor
            .get::<ForwardsUOffset<QuantizationView>>(vt::tensor::QUANTIZATION, None)
            .map(|q| decode_quantization(&q))
            .unwrap_or_default(),
        is_variable: tensor.scalar::<bool>(vt::tensor::IS_VARIABLE, false),
    }
}

/// A lone scale on dimension 0 reads back as affine, anything longer as
/// per-channel. A one-channel `PerChannel` on dimension 0 is written with the
/// same bytes as `Affine`, so it also reads back as affine.
fn decode_quantization(quantization: &QuantizationView<'_>) -> Quantization {
    let scales: Vec<f32> = quantization
        .get::<ForwardsUOffset<Vector<f32>>>(vt::quantization::SCALE, None)
        .map(|v| v.iter().collect())
        .unwrap_or_default();
    let zero_points: Vec<i64> = quantization
        .get::<ForwardsUOffset<Vector<i64>>>(vt::quantization::ZERO_POINT, None)
        .map(|v| v.iter().collect())
        .unwrap_or_default();
    let quantized_dimension = quantization.scalar::<i32>(vt::quantization::QUANTIZED_DIMENSION, 0);

    if scales.is_empty() {
        return Quantization::None;
    }
    if scales.len() == 1 && zero_points.len() == 1 && quantized_dimension == 0 {
        return Quantization::Affine {
            scale: scales[0],
            zero_point: zero_points[0] as i32,
        };
    }
    Quantization::PerChannel {
        scales,
        zero_points,
        quantized_dimension,
    }
}

fn decode_operator(op: &OperatorView<'_>) -> LoadedOperator {
    let options_type = op.scalar::<u8>(vt::operator::BUILTIN_OPTIONS_TYPE, builtin_options::NONE);
    LoadedOperator {
        opcode_index: op.scalar::<u32>(vt::operator::OPCODE_INDEX, 0),
        inputs: ints(op.get::<ForwardsUOffset<Vector<i32>>>(vt::operator::INPUTS, None)),
        outputs: ints(op.get::<ForwardsUOffset<Vector<i32>>>(vt::operator::OUTPUTS, None)),
        builtin_options_type: options_type,
        builtin_options: decode_options(op, options_type),
        custom_options: op
            .get::<ForwardsUOffset<Vector<u8>>>(vt::operator::CUSTOM_OPTIONS, None)
            .map(|v| v.bytes().to_vec()),
        custom_options_format: op.scalar::<i8>(vt::operator::CUSTOM_OPTIONS_FORMAT, 0),
    }
}

fn decode_options(op: &OperatorView<'_>, options_type: u8) -> BuiltinParams {
    const SLOT: VOffsetT = vt::operator::BUILTIN_OPTIONS;

    let decoded = match options_type {
        builtin_options::CONV_2D => op.get::<ForwardsUOffset<Conv2DOptionsView>>(SLOT, None).map(|o| {
            use vt::conv_2d_options as f;
            BuiltinParams::Conv2D {
                padding: Padding::from_code(o.scalar::<i8>(f::PADDING, 0)),
                stride_w: o.scalar::<i32>(f::STRIDE_W, 0),
                stride_h: o.scalar::<i32>(f::STRIDE_H, 0),
                activation: Activation::from_code(o.scalar::<i8>(f::FUSED_ACTIVATION_FUNCTION, 0)),
                dilation_w: o.scalar::<i32>(f::DILATION_W_FACTOR, 1),
                dilation_h: o.scalar::<i32>(f::DILATION_H_FACTOR, 1),
            }
        }),
        builtin_options::DEPTHWISE_CONV_2D => op
            .get::<ForwardsUOffset<DepthwiseConv2DOptionsView>>(SLOT, None)
            .map(|o| {
                use vt::depthwise_conv_2d_options as f;
                BuiltinParams::DepthwiseConv2D {
                    padding: Padding::from_code(o.scalar::<i8>(f::PADDING, 0)),
                    stride_w: o.scalar::<i32>(f::STRIDE_W, 0),
                    stride_h: o.scalar::<i32>(f::STRIDE_H, 0),
                    depth_multiplier: o.scalar::<i32>(f::DEPTH_MULTIPLIER, 0),
                    activation: Activation::from_code(o.scalar::<i8>(f::FUSED_ACTIVATION_FUNCTION, 0)),
                    dilation_w: o.scalar::<i32>(f::DILATION_W_FACTOR, 1),
                    dilation_h: o.scalar::<i32>(f::DILATION_H_FACTOR, 1),
                }
            }),
        builtin_options::POOL_2D => op.get::<ForwardsUOffset<Pool2DOptionsView>>(SLOT, None).map(|o| {
            use vt::pool_2d_options as f;
            BuiltinParams::Pool2D {
                padding: Padding::from_code(o.scalar::<i8>(f::PADDING, 0)),
                stride_w: o.scalar::<i32>(f::STRIDE_W, 0),
                stride_h: o.scalar::<i32>(f::STRIDE_H, 0),
                filter_width: o.scalar::<i32>(f::FILTER_WIDTH, 0),
                filter_height: o.scalar::<i32>(f::FILTER_HEIGHT, 0),
                activation: Activation::from_code(o.scalar::<i8>(f::FUSED_ACTIVATION_FUNCTION, 0)),
            }
        }),
        builtin_options::FULLY_CONNECTED => op
            .get::<ForwardsUOffset<FullyConnectedOptionsView>>(SLOT, None)
            .map(|o| {
                use vt::fully_connected_options as f;
                BuiltinParams::FullyConnected {
                    activation: Activation::from_code(o.scalar::<i8>(f::FUSED_ACTIVATION_FUNCTION, 0)),
                    keep_num_dims: o.scalar::<bool>(f::KEEP_NUM_DIMS, false),
                }
            }),
        builtin_options::SOFTMAX => op
            .get::<ForwardsUOffset<SoftmaxOptionsView>>(SLOT, None)
            .map(|o| BuiltinParams::Softmax {
                beta: o.scalar::<f32>(vt::softmax_options::BETA, 0.0),
            }),
        builtin_options::CONCATENATION => op
            .get::<ForwardsUOffset<ConcatenationOptionsView>>(SLOT, None)
            .map(|o| {
                use vt::concatenation_options as f;
                BuiltinParams::Concatenation {
                    axis: o.scalar::<i32>(f::AXIS, 0),
                    activation: Activation::from_code(o.scalar::<i8>(f::FUSED_ACTIVATION_FUNCTION, 0)),
                }
            }),
        builtin_options::ADD | builtin_options::SUB | builtin_options::MUL | builtin_options::DIV => op
            .get::<ForwardsUOffset<ArithmeticOptionsView>>(SLOT, None)
            .map(|o| BuiltinParams::Arithmetic {
                activation: Activation::from_code(
                    o.scalar::<i8>(vt::arithmetic_options::FUSED_ACTIVATION_FUNCTION, 0),
                ),
            }),
        builtin_options::RESHAPE => op
            .get::<ForwardsUOffset<ReshapeOptionsView>>(SLOT, None)
            .map(|o| BuiltinParams::Reshape {
                new_shape: ints(o.get::<ForwardsUOffset<Vector<i32>>>(vt::reshape_options::NEW_SHAPE, None)),
            }),
        _ => None,
    };
    decoded.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::{ModelExporter, TfLiteWriter, WriterConfig};
    use crate::ir::{RuntimeGraph, RuntimeOperator, RuntimeTensor};
    use crate::schema::builtin_op;
    use tempfile::tempdir;

    fn conv_graph() -> RuntimeGraph {
        let mut graph = RuntimeGraph::new();
        let x = graph.add_tensor(RuntimeTensor::new("x", ElementType::Float32, vec![1, 8, 8, 3]));
        let w = graph.add_tensor(RuntimeTensor::constant(
            "w",
            ElementType::Float32,
            vec![4, 3, 3, 3],
            vec![0u8; 4 * 3 * 3 * 3 * 4],
        ));
        let y = graph.add_tensor(RuntimeTensor::new("y", ElementType::Float32, vec![1, 8, 8, 4]));
        graph.add_node(RuntimeOperator::builtin(
            builtin_op::CONV_2D,
            BuiltinParams::Conv2D {
                padding: Padding::Same,
                stride_w: 1,
                stride_h: 1,
                activation: Activation::Relu6,
                dilation_w: 1,
                dilation_h: 2,
            },
            &[x, w],
            &[y],
        ));
        graph.inputs = vec![Some(x)];
        graph.outputs = vec![Some(y)];
        graph
    }

    #[test]
    fn test_load_rejects_foreign_bytes() {
        let result = TfLiteLoader::from_bytes(b"not a model at all");
        assert!(matches!(result, Err(LoaderError::InvalidFormat(_))));

        let result = TfLiteLoader::from_bytes(&[0, 0]);
        assert!(matches!(result, Err(LoaderError::InvalidFormat(_))));
    }

    #[test]
    fn test_load_rejects_truncated_model() {
        let graph = conv_graph();
        let bytes = TfLiteWriter::new(&graph).produce_buffer().unwrap();

        let result = TfLiteLoader::from_bytes(&bytes[..bytes.len() / 2]);

        assert!(matches!(result, Err(LoaderError::InvalidFormat(_))));
    }

    #[test]
    fn test_load_rejects_newer_schema() {
        let graph = conv_graph();
        let mut writer = TfLiteWriter::new(&graph);
        writer.config(WriterConfig {
            schema_version: SCHEMA_VERSION + 1,
            ..Default::default()
        });

        let result = TfLiteLoader::from_bytes(&writer.produce_buffer().unwrap());

        assert!(matches!(result, Err(LoaderError::UnsupportedVersion(_))));
    }

    #[test]
    fn test_load_from_file_decodes_builtin_options() {
        let graph = conv_graph();
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("conv.tflite");
        TfLiteWriter::new(&graph).write_to_path(&file_path).unwrap();

        let model = TfLiteLoader::load(&file_path).unwrap();
        let op = &model.subgraphs[0].operators[0];

        assert_eq!(op.builtin_options_type, builtin_options::CONV_2D);
        assert_eq!(
            op.builtin_options,
            BuiltinParams::Conv2D {
                padding: Padding::Same,
                stride_w: 1,
                stride_h: 1,
                activation: Activation::Relu6,
                dilation_w: 1,
                dilation_h: 2,
            }
        );
        assert_eq!(op.custom_options, None);
        assert_eq!(model.operator_codes[0].builtin_code, builtin_op::CONV_2D);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = TfLiteLoader::load(dir.path().join("absent.tflite"));
        assert!(matches!(result, Err(LoaderError::Io(_))));
    }

    #[test]
    fn test_single_channel_quantization_reads_back_as_affine() {
        let mut graph = RuntimeGraph::new();
        let mut q = RuntimeTensor::new("q", ElementType::UInt8, vec![1, 4]);
        q.quantization = Quantization::PerChannel {
            scales: vec![0.25],
            zero_points: vec![3],
            quantized_dimension: 0,
        };
        graph.add_tensor(q);

        let model = TfLiteLoader::from_bytes(&TfLiteWriter::new(&graph).produce_buffer().unwrap()).unwrap();

        assert_eq!(
            model.subgraphs[0].tensors[0].quantization,
            Quantization::Affine {
                scale: 0.25,
                zero_point: 3
            }
        );
    }
}
