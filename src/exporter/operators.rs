use flatbuffers::FlatBufferBuilder;

use crate::exporter::custom::{CustomOptionsFormat, CustomWriterRegistry};
use crate::exporter::opcodes::{OpCodeKey, OpCodeTable};
use crate::exporter::options::OptionsWriter;
use crate::exporter::tensors::WrittenTensorIndex;
use crate::exporter::{ExporterError, TableVector};
use crate::ir::{OperatorKind, RuntimeGraph, RuntimeOperator};
use crate::schema::{builtin_options, vt};

/// Writes the operators of an execution plan, in plan order.
pub struct OperatorExporter<'a> {
    pub graph: &'a RuntimeGraph,
    pub execution_plan: &'a [usize],
    pub written: &'a WrittenTensorIndex,
    pub custom_writers: &'a CustomWriterRegistry,
    pub options_writer: &'a dyn OptionsWriter,
}

impl<'a> OperatorExporter<'a> {
    fn node(&self, node_index: usize) -> Result<&'a RuntimeOperator, ExporterError> {
        self.graph.nodes.get(node_index).ok_or_else(|| {
            ExporterError::InvalidArgument(format!(
                "Execution plan references node {} of {}",
                node_index,
                self.graph.nodes.len()
            ))
        })
    }

    /// First pass: registers every planned operator in `opcodes`.
    ///
    /// Returns the opcode index of each plan entry. Must run over the whole
    /// plan before the opcode table is written.
    pub fn resolve_opcodes(&self, opcodes: &mut OpCodeTable) -> Result<Vec<u32>, ExporterError> {
        let mut indices = Vec::with_capacity(self.execution_plan.len());
        for &node_index in self.execution_plan {
            let node = self.node(node_index)?;
            indices.push(opcodes.resolve(OpCodeKey::from(&node.kind)));
        }
        log::debug!(
            "Resolved {} operators to {} opcodes",
            indices.len(),
            opcodes.len()
        );
        Ok(indices)
    }

    /// Second pass: writes one operator record per plan entry.
    pub fn write<'fbb>(
        &self,
        fbb: &mut FlatBufferBuilder<'fbb>,
        opcode_indices: &[u32],
    ) -> Result<TableVector<'fbb>, ExporterError> {
        let mut operators = Vec::with_capacity(self.execution_plan.len());

        for (&node_index, &opcode_index) in self.execution_plan.iter().zip(opcode_indices) {
            let node = self.node(node_index)?;
            let inputs = self.written.remap(&node.inputs)?;
            let outputs = self.written.remap(&node.outputs)?;

            let mut options_type = builtin_options::NONE;
            let mut options = None;
            let mut custom_options = None;
            let mut custom_format = CustomOptionsFormat::default();

            match &node.kind {
                OperatorKind::Builtin { code, params } => {
                    (options_type, options) = self.options_writer.write(fbb, *code, params);
                }
                OperatorKind::Custom { name, initial_data } => {
                    let payload = match self.custom_writers.get(name) {
                        Some(writer) => {
                            let (payload, format) = writer(self.graph, node_index);
                            custom_format = format;
                            fbb.create_vector(&payload)
                        }
                        // No writer: the runtime's raw option bytes are written as-is.
                        None => fbb.create_vector(initial_data),
                    };
                    custom_options = Some(payload);
                }
            }

            log::trace!(
                "Operator {} opcode {} inputs {:?} outputs {:?}",
                node_index,
                opcode_index,
                inputs,
                outputs
            );

            let inputs = fbb.create_vector(&inputs);
            let outputs = fbb.create_vector(&outputs);

            let start = fbb.start_table();
            fbb.push_slot::<u32>(vt::operator::OPCODE_INDEX, opcode_index, 0);
            fbb.push_slot_always(vt::operator::INPUTS, inputs);
            fbb.push_slot_always(vt::operator::OUTPUTS, outputs);
            fbb.push_slot::<u8>(vt::operator::BUILTIN_OPTIONS_TYPE, options_type, builtin_options::NONE);
            if let Some(options) = options {
                fbb.push_slot_always(vt::operator::BUILTIN_OPTIONS, options);
            }
            if let Some(custom_options) = custom_options {
                fbb.push_slot_always(vt::operator::CUSTOM_OPTIONS, custom_options);
            }
            fbb.push_slot::<i8>(vt::operator::CUSTOM_OPTIONS_FORMAT, custom_format.code(), 0);
            operators.push(fbb.end_table(start));
        }

        log::debug!("Exported {} operators", operators.len());
        Ok(fbb.create_vector(&operators))
    }
}
