use std::collections::HashSet;

use flatbuffers::{FlatBufferBuilder, TableFinishedWIPOffset, WIPOffset};

use crate::exporter::buffers::BufferList;
use crate::exporter::{ExporterError, TableVector};
use crate::ir::{AllocationKind, Quantization, RuntimeGraph, RuntimeTensor, TensorRef};
use crate::schema::{vt, EMPTY_BUFFER, OPTIONAL_TENSOR};

/// Maps runtime tensor ids to their dense index in the written model.
///
/// Exported indices are contiguous from 0, assigned in ascending runtime id
/// order. Temporaries, caller-declared unused tensors and tensors without a
/// serializable allocation are not exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTensorIndex {
    written: Vec<Option<u32>>,
    count: usize,
}

impl WrittenTensorIndex {
    pub fn build(graph: &RuntimeGraph, unused: &HashSet<usize>) -> Result<Self, ExporterError> {
        let mut is_temporary = vec![false; graph.tensors.len()];
        for (node_index, node) in graph.nodes.iter().enumerate() {
            for &tensor_id in &node.temporaries {
                let slot = is_temporary.get_mut(tensor_id).ok_or_else(|| {
                    ExporterError::InvalidArgument(format!(
                        "Node {} references temporary tensor {} of {}",
                        node_index,
                        tensor_id,
                        graph.tensors.len()
                    ))
                })?;
                *slot = true;
            }
        }

        let mut written = Vec::with_capacity(graph.tensors.len());
        let mut count = 0usize;
        for (tensor_id, tensor) in graph.tensors.iter().enumerate() {
            if is_temporary[tensor_id] || unused.contains(&tensor_id) {
                written.push(None);
                continue;
            }
            if !tensor.allocation.is_exportable() {
                log::warn!(
                    "Skipping tensor {} ({:?}) with {:?} allocation",
                    tensor_id,
                    tensor.name,
                    tensor.allocation
                );
                written.push(None);
                continue;
            }
            written.push(Some(count as u32));
            count += 1;
        }

        log::debug!("Exporting {} of {} tensors", count, graph.tensors.len());
        Ok(Self { written, count })
    }

    /// Dense index of a runtime tensor, if it is exported.
    pub fn get(&self, tensor_id: usize) -> Option<u32> {
        self.written.get(tensor_id).copied().flatten()
    }

    /// Number of exported tensors.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Rewrites a tensor list into written indices.
    ///
    /// Absent optional tensors stay in place as `-1`; references to tensors
    /// that are not exported are dropped from the list.
    pub fn remap(&self, refs: &[TensorRef]) -> Result<Vec<i32>, ExporterError> {
        let mut remapped = Vec::with_capacity(refs.len());
        for tensor_ref in refs {
            let Some(tensor_id) = *tensor_ref else {
                remapped.push(OPTIONAL_TENSOR);
                continue;
            };
            match self.written.get(tensor_id) {
                Some(Some(index)) => remapped.push(*index as i32),
                Some(None) => {}
                None => {
                    return Err(ExporterError::InvalidArgument(format!(
                        "Tensor {} out of range, graph has {}",
                        tensor_id,
                        self.written.len()
                    )))
                }
            }
        }
        Ok(remapped)
    }
}

/// Writes a record for every exported tensor, in written index order.
///
/// Memory-mapped tensors get their bytes appended to `buffers`; every other
/// tensor points at the empty buffer 0.
pub fn export_tensors<'fbb, 'g>(
    fbb: &mut FlatBufferBuilder<'fbb>,
    graph: &'g RuntimeGraph,
    written: &WrittenTensorIndex,
    buffers: &mut BufferList<'g>,
) -> TableVector<'fbb> {
    let mut tensors = Vec::with_capacity(written.len());

    for (tensor_id, tensor) in graph.tensors.iter().enumerate() {
        if written.get(tensor_id).is_none() {
            continue;
        }

        let buffer_index = if tensor.allocation == AllocationKind::MmapRo {
            let data = tensor.data.as_deref().unwrap_or_default();
            if tensor.data.is_none() {
                log::warn!("Constant tensor {} ({:?}) has no data", tensor_id, tensor.name);
            }
            buffers.push(data)
        } else {
            EMPTY_BUFFER
        };

        log::trace!(
            "Tensor {} -> {:?}: {:?} {:?} buffer {}",
            tensor_id,
            written.get(tensor_id),
            tensor.element_type,
            tensor.shape,
            buffer_index
        );
        tensors.push(write_tensor(fbb, tensor, buffer_index));
    }

    fbb.create_vector(&tensors)
}

fn write_tensor<'fbb>(
    fbb: &mut FlatBufferBuilder<'fbb>,
    tensor: &RuntimeTensor,
    buffer_index: u32,
) -> WIPOffset<TableFinishedWIPOffset> {
    let shape = fbb.create_vector(&tensor.shape);
    let name = fbb.create_string(&tensor.name);
    let quantization = write_quantization(fbb, &tensor.quantization);

    let start = fbb.start_table();
    fbb.push_slot_always(vt::tensor::SHAPE, shape);
    fbb.push_slot::<i8>(vt::tensor::TYPE, tensor.element_type.schema_type(), 0);
    fbb.push_slot::<u32>(vt::tensor::BUFFER, buffer_index, 0);
    fbb.push_slot_always(vt::tensor::NAME, name);
    fbb.push_slot_always(vt::tensor::QUANTIZATION, quantization);
    fbb.push_slot::<bool>(vt::tensor::IS_VARIABLE, tensor.is_variable, false);
    fbb.end_table(start)
}

/// Per-channel parameters win over a single scale, and a single scale is
/// only written when non-zero. The table itself is always present.
fn write_quantization<'fbb>(
    fbb: &mut FlatBufferBuilder<'fbb>,
    quantization: &Quantization,
) -> WIPOffset<TableFinishedWIPOffset> {
    match quantization {
        Quantization::PerChannel {
            scales,
            zero_points,
            quantized_dimension,
        } => {
            let scale = fbb.create_vector(scales);
            let zero_point = fbb.create_vector(zero_points);
            let start = fbb.start_table();
            fbb.push_slot_always(vt::quantization::SCALE, scale);
            fbb.push_slot_always(vt::quantization::ZERO_POINT, zero_point);
            fbb.push_slot::<i32>(vt::quantization::QUANTIZED_DIMENSION, *quantized_dimension, 0);
            fbb.end_table(start)
        }
        Quantization::Affine { scale, zero_point } if *scale != 0.0 => {
            let scale = fbb.create_vector(&[*scale]);
            let zero_point = fbb.create_vector(&[*zero_point as i64]);
            let start = fbb.start_table();
            fbb.push_slot_always(vt::quantization::SCALE, scale);
            fbb.push_slot_always(vt::quantization::ZERO_POINT, zero_point);
            fbb.end_table(start)
        }
        _ => {
            let start = fbb.start_table();
            fbb.end_table(start)
        }
    }
}
