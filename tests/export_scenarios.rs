use litewriter::exporter::{CustomOptionsFormat, ExporterError, ModelExporter, TfLiteWriter};
use litewriter::ir::{
    Activation, AllocationKind, BuiltinParams, ElementType, Quantization, RuntimeGraph, RuntimeOperator,
    RuntimeTensor,
};
use litewriter::loader::{LoadedModel, TfLiteLoader};
use litewriter::schema::{builtin_op, builtin_options, custom_options_format, DEFAULT_DESCRIPTION, SCHEMA_VERSION};

fn export(writer: &TfLiteWriter<'_>) -> LoadedModel {
    let bytes = writer.produce_buffer().unwrap();
    assert_eq!(&bytes[4..8], b"TFL3");
    TfLiteLoader::from_bytes(&bytes).unwrap()
}

fn arena(name: &str) -> RuntimeTensor {
    RuntimeTensor::new(name, ElementType::Float32, vec![1, 2])
}

#[test]
fn test_weights_and_temporaries() {
    let mut graph = RuntimeGraph::new();
    let mut a = RuntimeTensor::constant("A", ElementType::UInt8, vec![4], vec![10, 20, 30, 40]);
    a.quantization = Quantization::Affine {
        scale: 0.5,
        zero_point: 0,
    };
    let a = graph.add_tensor(a);
    let b = graph.add_tensor(arena("B"));
    let c = graph.add_tensor(arena("C"));
    let mut node = RuntimeOperator::builtin(builtin_op::ADD, BuiltinParams::None, &[a, b], &[]);
    node.temporaries = vec![c];
    graph.add_node(node);

    let model = export(&TfLiteWriter::new(&graph));

    assert_eq!(model.version, SCHEMA_VERSION);
    assert_eq!(model.description.as_deref(), Some(DEFAULT_DESCRIPTION));
    assert_eq!(model.subgraphs.len(), 1);
    let subgraph = &model.subgraphs[0];

    assert_eq!(subgraph.tensors.len(), 2);
    assert_eq!(subgraph.tensors[0].name, "A");
    assert_eq!(subgraph.tensors[0].buffer, 1);
    assert_eq!(
        subgraph.tensors[0].quantization,
        Quantization::Affine {
            scale: 0.5,
            zero_point: 0
        }
    );
    assert_eq!(subgraph.tensors[1].name, "B");
    assert_eq!(subgraph.tensors[1].buffer, 0);
    assert_eq!(subgraph.tensors[1].quantization, Quantization::None);
    assert!(subgraph.tensors.iter().all(|t| t.name != "C"));

    // Buffer 0 is the empty placeholder.
    assert_eq!(model.buffers, vec![vec![], vec![10, 20, 30, 40]]);

    assert_eq!(model.operator_codes.len(), 1);
    assert_eq!(subgraph.operators.len(), 1);
    assert_eq!(subgraph.operators[0].inputs, vec![0, 1]);
    assert!(subgraph.operators[0].outputs.is_empty());
}

#[test]
fn test_custom_op_without_writer_keeps_raw_data() {
    let mut graph = RuntimeGraph::new();
    let x = graph.add_tensor(arena("x"));
    let y = graph.add_tensor(arena("y"));
    let raw: Vec<u8> = (0..10).collect();
    graph.add_node(RuntimeOperator::custom("Unregistered", raw.clone(), &[x], &[y]));

    let model = export(&TfLiteWriter::new(&graph));
    let op = &model.subgraphs[0].operators[0];

    assert_eq!(op.custom_options.as_deref(), Some(&raw[..]));
    assert_eq!(op.custom_options_format, custom_options_format::FLEXBUFFERS);
    assert_eq!(op.builtin_options_type, builtin_options::NONE);
    assert_eq!(model.operator_codes[0].builtin_code, builtin_op::CUSTOM);
    assert_eq!(model.operator_codes[0].custom_code.as_deref(), Some("Unregistered"));
}

#[test]
fn test_registered_custom_writer_produces_payload() {
    let mut graph = RuntimeGraph::new();
    let x = graph.add_tensor(arena("x"));
    let y = graph.add_tensor(arena("y"));
    graph.add_node(RuntimeOperator::builtin(builtin_op::RELU, BuiltinParams::None, &[x], &[y]));
    graph.add_node(RuntimeOperator::custom("Scale", vec![0xff], &[y], &[x]));

    let mut writer = TfLiteWriter::new(&graph);
    writer
        .register_custom_writer("Scale", |graph, node_index| {
            let inputs = graph.nodes[node_index].inputs.len() as u8;
            (vec![node_index as u8, inputs], CustomOptionsFormat::Flexbuffers)
        })
        .unwrap();

    let model = export(&writer);
    let op = &model.subgraphs[0].operators[1];

    assert_eq!(op.custom_options, Some(vec![1, 1]));
}

#[test]
fn test_duplicate_custom_writer_is_rejected() {
    let graph = RuntimeGraph::new();
    let mut writer = TfLiteWriter::new(&graph);

    writer
        .register_custom_writer("Op", |_, _| (Vec::new(), CustomOptionsFormat::Flexbuffers))
        .unwrap();
    let second = writer.register_custom_writer("Op", |_, _| (vec![1], CustomOptionsFormat::Flexbuffers));

    assert!(matches!(second, Err(ExporterError::DuplicateRegistration(_))));
}

#[test]
fn test_absent_optional_inputs_survive_remapping() {
    let mut graph = RuntimeGraph::new();
    let temp = graph.add_tensor(arena("scratch"));
    let x = graph.add_tensor(arena("x"));
    let bias = graph.add_tensor(arena("bias"));
    let y = graph.add_tensor(arena("y"));
    let mut node = RuntimeOperator::builtin(
        builtin_op::FULLY_CONNECTED,
        BuiltinParams::FullyConnected {
            activation: Activation::Relu,
            keep_num_dims: true,
        },
        &[],
        &[y],
    );
    node.inputs = vec![Some(x), None, Some(temp), Some(bias)];
    node.temporaries = vec![temp];
    graph.add_node(node);
    graph.inputs = vec![Some(x), None];
    graph.outputs = vec![Some(y)];

    let model = export(&TfLiteWriter::new(&graph));
    let subgraph = &model.subgraphs[0];
    let op = &subgraph.operators[0];

    assert_eq!(op.inputs, vec![0, -1, 1]);
    assert_eq!(op.outputs, vec![2]);
    assert_eq!(subgraph.inputs, vec![0, -1]);
    assert_eq!(subgraph.outputs, vec![2]);
    assert_eq!(
        op.builtin_options,
        BuiltinParams::FullyConnected {
            activation: Activation::Relu,
            keep_num_dims: true,
        }
    );
    for list in [&op.inputs, &op.outputs, &subgraph.inputs, &subgraph.outputs] {
        assert!(list.iter().all(|&i| i >= -1 && i < subgraph.tensors.len() as i32));
    }
}

#[test]
fn test_quantization_exclusivity() {
    let mut graph = RuntimeGraph::new();
    let mut per_channel = arena("per_channel");
    per_channel.quantization = Quantization::PerChannel {
        scales: vec![0.1, 0.2, 0.3],
        zero_points: vec![0, 1, 2],
        quantized_dimension: 1,
    };
    let mut zero_scale = arena("zero_scale");
    zero_scale.quantization = Quantization::Affine {
        scale: 0.0,
        zero_point: 7,
    };
    graph.add_tensor(per_channel);
    graph.add_tensor(zero_scale);

    let model = export(&TfLiteWriter::new(&graph));
    let tensors = &model.subgraphs[0].tensors;

    assert_eq!(
        tensors[0].quantization,
        Quantization::PerChannel {
            scales: vec![0.1, 0.2, 0.3],
            zero_points: vec![0, 1, 2],
            quantized_dimension: 1,
        }
    );
    assert_eq!(tensors[1].quantization, Quantization::None);
}

#[test]
fn test_opcode_table_is_deduplicated() {
    let mut graph = RuntimeGraph::new();
    let x = graph.add_tensor(arena("x"));
    let y = graph.add_tensor(arena("y"));
    let arithmetic = BuiltinParams::Arithmetic {
        activation: Activation::None,
    };
    graph.add_node(RuntimeOperator::builtin(builtin_op::ADD, arithmetic.clone(), &[x, x], &[y]));
    graph.add_node(RuntimeOperator::custom("Mine", Vec::new(), &[y], &[x]));
    graph.add_node(RuntimeOperator::builtin(builtin_op::MUL, arithmetic.clone(), &[x, y], &[y]));
    graph.add_node(RuntimeOperator::builtin(builtin_op::ADD, arithmetic, &[y, y], &[x]));
    graph.add_node(RuntimeOperator::custom("Mine", Vec::new(), &[x], &[y]));

    let model = export(&TfLiteWriter::new(&graph));
    let codes = &model.operator_codes;
    let operators = &model.subgraphs[0].operators;

    assert_eq!(codes.len(), 3);
    let indices: Vec<u32> = operators.iter().map(|op| op.opcode_index).collect();
    assert_eq!(indices, vec![0, 1, 2, 0, 1]);
    assert_eq!(codes[0].builtin_code, builtin_op::ADD);
    assert_eq!(codes[1].custom_code.as_deref(), Some("Mine"));
    assert_eq!(codes[2].builtin_code, builtin_op::MUL);
    assert_eq!(operators[2].builtin_options_type, builtin_options::MUL);
}

#[test]
fn test_round_trip_counts_follow_plan_and_eligibility() {
    let mut graph = RuntimeGraph::new();
    let weights: Vec<Vec<u8>> = vec![vec![1, 2, 3], vec![], vec![4; 33]];
    let mut ids = Vec::new();
    for (i, data) in weights.iter().enumerate() {
        ids.push(graph.add_tensor(RuntimeTensor::constant(
            &format!("w{}", i),
            ElementType::Int8,
            vec![data.len() as i32],
            data.clone(),
        )));
    }
    let mut dynamic = arena("dynamic");
    dynamic.allocation = AllocationKind::Dynamic;
    let dynamic = graph.add_tensor(dynamic);
    let mut state = arena("state");
    state.allocation = AllocationKind::ArenaRwPersistent;
    state.is_variable = true;
    let state = graph.add_tensor(state);
    let out = graph.add_tensor(arena("out"));

    graph.add_node(RuntimeOperator::builtin(
        builtin_op::CONCATENATION,
        BuiltinParams::Concatenation {
            axis: 0,
            activation: Activation::None,
        },
        &[ids[0], ids[1], ids[2], dynamic],
        &[out],
    ));
    graph.add_node(RuntimeOperator::builtin(builtin_op::TANH, BuiltinParams::None, &[out], &[state]));
    graph.add_node(RuntimeOperator::builtin(builtin_op::RELU, BuiltinParams::None, &[state], &[out]));
    // Node 1 is not scheduled.
    graph.execution_plan = vec![0, 2];

    let model = export(&TfLiteWriter::new(&graph));
    let subgraph = &model.subgraphs[0];

    assert_eq!(subgraph.operators.len(), 2);
    assert_eq!(subgraph.tensors.len(), 5);
    assert_eq!(subgraph.operators[0].inputs, vec![0, 1, 2]);
    assert_eq!(subgraph.operators[0].outputs, vec![4]);
    assert!(subgraph.tensors[3].is_variable);
    assert_eq!(subgraph.tensors[3].element_type, ElementType::Float32);

    assert_eq!(model.buffers.len(), 4);
    for (i, data) in weights.iter().enumerate() {
        let buffer = subgraph.tensors[i].buffer as usize;
        assert_eq!(buffer, i + 1);
        assert_eq!(&model.buffers[buffer], data);
    }
}
