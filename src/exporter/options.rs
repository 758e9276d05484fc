use flatbuffers::{FlatBufferBuilder, UnionWIPOffset, WIPOffset};

use crate::ir::{Activation, BuiltinParams};
use crate::schema::{builtin_op, builtin_options, vt};

/// Encodes the parameter block of a builtin operator into its options union.
///
/// Returns the union tag and the offset of the options table, or
/// `builtin_options::NONE` and `None` when the operator has no options.
pub trait OptionsWriter {
    fn write<'fbb>(
        &self,
        fbb: &mut FlatBufferBuilder<'fbb>,
        code: i32,
        params: &BuiltinParams,
    ) -> (u8, Option<WIPOffset<UnionWIPOffset>>);
}

/// Options encoding for the builtin kernels the runtime ships with.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinOptionsWriter;

impl OptionsWriter for BuiltinOptionsWriter {
    fn write<'fbb>(
        &self,
        fbb: &mut FlatBufferBuilder<'fbb>,
        code: i32,
        params: &BuiltinParams,
    ) -> (u8, Option<WIPOffset<UnionWIPOffset>>) {
        match (code, params) {
            (
                builtin_op::CONV_2D,
                BuiltinParams::Conv2D {
                    padding,
                    stride_w,
                    stride_h,
                    activation,
                    dilation_w,
                    dilation_h,
                },
            ) => {
                use vt::conv_2d_options as f;
                let start = fbb.start_table();
                fbb.push_slot::<i8>(f::PADDING, padding.code(), 0);
                fbb.push_slot::<i32>(f::STRIDE_W, *stride_w, 0);
                fbb.push_slot::<i32>(f::STRIDE_H, *stride_h, 0);
                fbb.push_slot::<i8>(f::FUSED_ACTIVATION_FUNCTION, activation.code(), 0);
                fbb.push_slot::<i32>(f::DILATION_W_FACTOR, *dilation_w, 1);
                fbb.push_slot::<i32>(f::DILATION_H_FACTOR, *dilation_h, 1);
                let table = fbb.end_table(start);
                (builtin_options::CONV_2D, Some(table.as_union_value()))
            }
            (
                builtin_op::DEPTHWISE_CONV_2D,
                BuiltinParams::DepthwiseConv2D {
                    padding,
                    stride_w,
                    stride_h,
                    depth_multiplier,
                    activation,
                    dilation_w,
                    dilation_h,
                },
            ) => {
                use vt::depthwise_conv_2d_options as f;
                let start = fbb.start_table();
                fbb.push_slot::<i8>(f::PADDING, padding.code(), 0);
                fbb.push_slot::<i32>(f::STRIDE_W, *stride_w, 0);
                fbb.push_slot::<i32>(f::STRIDE_H, *stride_h, 0);
                fbb.push_slot::<i32>(f::DEPTH_MULTIPLIER, *depth_multiplier, 0);
                fbb.push_slot::<i8>(f::FUSED_ACTIVATION_FUNCTION, activation.code(), 0);
                fbb.push_slot::<i32>(f::DILATION_W_FACTOR, *dilation_w, 1);
                fbb.push_slot::<i32>(f::DILATION_H_FACTOR, *dilation_h, 1);
                let table = fbb.end_table(start);
                (builtin_options::DEPTHWISE_CONV_2D, Some(table.as_union_value()))
            }
            (
                builtin_op::AVERAGE_POOL_2D | builtin_op::MAX_POOL_2D | builtin_op::L2_POOL_2D,
                BuiltinParams::Pool2D {
                    padding,
                    stride_w,
                    stride_h,
                    filter_width,
                    filter_height,
                    activation,
                },
            ) => {
                use vt::pool_2d_options as f;
                let start = fbb.start_table();
                fbb.push_slot::<i8>(f::PADDING, padding.code(), 0);
                fbb.push_slot::<i32>(f::STRIDE_W, *stride_w, 0);
                fbb.push_slot::<i32>(f::STRIDE_H, *stride_h, 0);
                fbb.push_slot::<i32>(f::FILTER_WIDTH, *filter_width, 0);
                fbb.push_slot::<i32>(f::FILTER_HEIGHT, *filter_height, 0);
                fbb.push_slot::<i8>(f::FUSED_ACTIVATION_FUNCTION, activation.code(), 0);
                let table = fbb.end_table(start);
                (builtin_options::POOL_2D, Some(table.as_union_value()))
            }
            (
                builtin_op::FULLY_CONNECTED,
                BuiltinParams::FullyConnected {
                    activation,
                    keep_num_dims,
                },
            ) => {
                use vt::fully_connected_options as f;
                let start = fbb.start_table();
                fbb.push_slot::<i8>(f::FUSED_ACTIVATION_FUNCTION, activation.code(), 0);
                fbb.push_slot::<bool>(f::KEEP_NUM_DIMS, *keep_num_dims, false);
                let table = fbb.end_table(start);
                (builtin_options::FULLY_CONNECTED, Some(table.as_union_value()))
            }
            (builtin_op::SOFTMAX, BuiltinParams::Softmax { beta }) => {
                let start = fbb.start_table();
                fbb.push_slot::<f32>(vt::softmax_options::BETA, *beta, 0.0);
                let table = fbb.end_table(start);
                (builtin_options::SOFTMAX, Some(table.as_union_value()))
            }
            (builtin_op::CONCATENATION, BuiltinParams::Concatenation { axis, activation }) => {
                use vt::concatenation_options as f;
                let start = fbb.start_table();
                fbb.push_slot::<i32>(f::AXIS, *axis, 0);
                fbb.push_slot::<i8>(f::FUSED_ACTIVATION_FUNCTION, activation.code(), 0);
                let table = fbb.end_table(start);
                (builtin_options::CONCATENATION, Some(table.as_union_value()))
            }
            (builtin_op::ADD, BuiltinParams::Arithmetic { activation }) => {
                arithmetic(fbb, builtin_options::ADD, *activation)
            }
            (builtin_op::SUB, BuiltinParams::Arithmetic { activation }) => {
                arithmetic(fbb, builtin_options::SUB, *activation)
            }
            (builtin_op::MUL, BuiltinParams::Arithmetic { activation }) => {
                arithmetic(fbb, builtin_options::MUL, *activation)
            }
            (builtin_op::DIV, BuiltinParams::Arithmetic { activation }) => {
                arithmetic(fbb, builtin_options::DIV, *activation)
            }
            (builtin_op::RESHAPE, BuiltinParams::Reshape { new_shape }) => {
                let new_shape = fbb.create_vector(new_shape);
                let start = fbb.start_table();
                fbb.push_slot_always(vt::reshape_options::NEW_SHAPE, new_shape);
                let table = fbb.end_table(start);
                (builtin_options::RESHAPE, Some(table.as_union_value()))
            }
            (_, BuiltinParams::None) => (builtin_options::NONE, None),
            (code, params) => {
                log::warn!("No options encoding for builtin {} with {:?}", code, params);
                (builtin_options::NONE, None)
            }
        }
    }
}

fn arithmetic(
    fbb: &mut FlatBufferBuilder<'_>,
    tag: u8,
    activation: Activation,
) -> (u8, Option<WIPOffset<UnionWIPOffset>>) {
    let start = fbb.start_table();
    fbb.push_slot::<i8>(vt::arithmetic_options::FUSED_ACTIVATION_FUNCTION, activation.code(), 0);
    let table = fbb.end_table(start);
    (tag, Some(table.as_union_value()))
}
