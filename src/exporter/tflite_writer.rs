use std::collections::HashSet;

use flatbuffers::FlatBufferBuilder;

use crate::exporter::buffers::{export_buffers, BufferList};
use crate::exporter::custom::{CustomOptionsFormat, CustomWriterRegistry};
use crate::exporter::opcodes::OpCodeTable;
use crate::exporter::operators::OperatorExporter;
use crate::exporter::options::{BuiltinOptionsWriter, OptionsWriter};
use crate::exporter::tensors::{export_tensors, WrittenTensorIndex};
use crate::exporter::{ExporterError, ModelExporter};
use crate::ir::{RuntimeGraph, TensorRef};
use crate::schema::{vt, DEFAULT_DESCRIPTION, FILE_IDENTIFIER, SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq)]
pub struct WriterConfig {
    pub description: String,
    pub schema_version: u32,
    /// Initial size of the flatbuffer builder, in bytes.
    pub initial_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            description: DEFAULT_DESCRIPTION.to_string(),
            schema_version: SCHEMA_VERSION,
            initial_capacity: 10240,
        }
    }
}

/// Graph I/O and plan that replace the graph's own for export.
#[derive(Debug, Clone)]
struct CustomInputOutput {
    inputs: Vec<TensorRef>,
    outputs: Vec<TensorRef>,
    execution_plan: Vec<usize>,
}

/// Writes a [`RuntimeGraph`] as a single-subgraph TFLite model.
///
/// The writer only borrows the graph. Every export runs in its own session,
/// so the same writer can produce any number of identical buffers.
pub struct TfLiteWriter<'g> {
    graph: &'g RuntimeGraph,
    config: WriterConfig,
    unused_tensors: HashSet<usize>,
    custom_io: Option<CustomInputOutput>,
    custom_writers: CustomWriterRegistry,
    options_writer: Box<dyn OptionsWriter + Send + Sync>,
}

impl<'g> TfLiteWriter<'g> {
    pub fn new(graph: &'g RuntimeGraph) -> Self {
        Self {
            graph,
            config: WriterConfig::default(),
            unused_tensors: HashSet::new(),
            custom_io: None,
            custom_writers: CustomWriterRegistry::new(),
            options_writer: Box::new(BuiltinOptionsWriter),
        }
    }

    pub fn config(&mut self, config: WriterConfig) -> &mut Self {
        self.config = config;
        self
    }

    /// Tensors the caller knows to be dead; they are left out of the model.
    pub fn unused_tensors(&mut self, unused: impl IntoIterator<Item = usize>) -> &mut Self {
        self.unused_tensors = unused.into_iter().collect();
        self
    }

    /// Exports with these graph inputs, outputs and execution plan instead of
    /// the graph's own. No consistency checks are made.
    pub fn custom_input_output(
        &mut self,
        inputs: Vec<TensorRef>,
        outputs: Vec<TensorRef>,
        execution_plan: Vec<usize>,
    ) -> &mut Self {
        self.custom_io = Some(CustomInputOutput {
            inputs,
            outputs,
            execution_plan,
        });
        self
    }

    /// Replaces the encoder used for builtin operator options.
    pub fn options_writer(&mut self, writer: impl OptionsWriter + Send + Sync + 'static) -> &mut Self {
        self.options_writer = Box::new(writer);
        self
    }

    pub fn register_custom_writer<F>(&mut self, name: &str, writer: F) -> Result<(), ExporterError>
    where
        F: Fn(&RuntimeGraph, usize) -> (Vec<u8>, CustomOptionsFormat) + Send + Sync + 'static,
    {
        self.custom_writers.register(name, writer)
    }

    fn inputs(&self) -> &[TensorRef] {
        self.custom_io.as_ref().map_or(&self.graph.inputs, |io| &io.inputs)
    }

    fn outputs(&self) -> &[TensorRef] {
        self.custom_io.as_ref().map_or(&self.graph.outputs, |io| &io.outputs)
    }

    fn execution_plan(&self) -> &[usize] {
        self.custom_io
            .as_ref()
            .map_or(&self.graph.execution_plan, |io| &io.execution_plan)
    }
}

impl ModelExporter for TfLiteWriter<'_> {
    fn produce_buffer(&self) -> Result<Vec<u8>, ExporterError> {
        ExportSession::new(self)?.finish()
    }
}

/// State of one export: the tensor remap, the opcode table and the buffers.
struct ExportSession<'w, 'g> {
    writer: &'w TfLiteWriter<'g>,
    fbb: FlatBufferBuilder<'static>,
    written: WrittenTensorIndex,
    opcodes: OpCodeTable,
    buffers: BufferList<'g>,
}

impl<'w, 'g> ExportSession<'w, 'g> {
    fn new(writer: &'w TfLiteWriter<'g>) -> Result<Self, ExporterError> {
        Ok(Self {
            writer,
            fbb: FlatBufferBuilder::with_capacity(writer.config.initial_capacity),
            written: WrittenTensorIndex::build(writer.graph, &writer.unused_tensors)?,
            opcodes: OpCodeTable::new(),
            buffers: BufferList::new(),
        })
    }

    fn finish(mut self) -> Result<Vec<u8>, ExporterError> {
        let writer = self.writer;
        let graph = writer.graph;
        log::debug!(
            "Exporting graph: {} tensors, {} nodes, {} planned",
            graph.tensors.len(),
            graph.nodes.len(),
            writer.execution_plan().len()
        );

        let subgraph = {
            let tensors = export_tensors(&mut self.fbb, graph, &self.written, &mut self.buffers);
            let inputs = self.written.remap(writer.inputs())?;
            let outputs = self.written.remap(writer.outputs())?;
            let inputs = self.fbb.create_vector(&inputs);
            let outputs = self.fbb.create_vector(&outputs);

            let operator_exporter = OperatorExporter {
                graph,
                execution_plan: writer.execution_plan(),
                written: &self.written,
                custom_writers: &writer.custom_writers,
                options_writer: &*writer.options_writer,
            };
            let opcode_indices = operator_exporter.resolve_opcodes(&mut self.opcodes)?;
            let operators = operator_exporter.write(&mut self.fbb, &opcode_indices)?;

            let start = self.fbb.start_table();
            self.fbb.push_slot_always(vt::sub_graph::TENSORS, tensors);
            self.fbb.push_slot_always(vt::sub_graph::INPUTS, inputs);
            self.fbb.push_slot_always(vt::sub_graph::OUTPUTS, outputs);
            self.fbb.push_slot_always(vt::sub_graph::OPERATORS, operators);
            self.fbb.end_table(start)
        };
        let subgraphs = self.fbb.create_vector(&[subgraph]);

        let buffers = export_buffers(&mut self.fbb, &self.buffers);
        let description = self.fbb.create_string(&writer.config.description);
        let operator_codes = self.opcodes.write(&mut self.fbb);

        let model = {
            let start = self.fbb.start_table();
            self.fbb
                .push_slot::<u32>(vt::model::VERSION, writer.config.schema_version, 0);
            self.fbb.push_slot_always(vt::model::OPERATOR_CODES, operator_codes);
            self.fbb.push_slot_always(vt::model::SUBGRAPHS, subgraphs);
            self.fbb.push_slot_always(vt::model::DESCRIPTION, description);
            self.fbb.push_slot_always(vt::model::BUFFERS, buffers);
            self.fbb.end_table(start)
        };

        self.fbb.finish(model, Some(FILE_IDENTIFIER));
        let data = self.fbb.finished_data().to_vec();
        log::debug!(
            "Finished model: {} bytes, {} opcodes, {} buffers",
            data.len(),
            self.opcodes.len(),
            self.buffers.len()
        );
        Ok(data)
    }
}
