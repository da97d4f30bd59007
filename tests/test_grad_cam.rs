/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 多层Grad-CAM的集成测试
 *
 * 标签只选中第0个图时，第1个图所有节点的归因为0；
 * 复合图网络层的每个内部块都参与拼接；
 * 无标签时，只依赖第0个图的预测同样使第1个图的归因为0
 */

use std::sync::Arc;

use graph_saliency::graph::{Graph, GraphBatch, LABEL, SALIENCY};
use graph_saliency::errors::SaliencyError;
use graph_saliency::nn::{
    Activation, GraphConv, GraphNetwork, Layer, Linear, Model, Pooling, Readout, Value,
};
use graph_saliency::saliency::{MethodKind, ReduceMode, Saliency, SaliencyConfig};
use graph_saliency::tensor::Tensor;

fn unlabeled(num_nodes: usize, seed: u64) -> Graph {
    let source = (0..num_nodes - 1).collect::<Vec<_>>();
    let target = (1..num_nodes).collect::<Vec<_>>();
    Graph::new(Tensor::new_random_seeded(0.1, 1., &[num_nodes, 3], seed))
        .unwrap()
        .with_edges(source, target)
        .unwrap()
}

fn graph(num_nodes: usize, label: f32, seed: u64) -> Graph {
    unlabeled(num_nodes, seed).with_context(LABEL, Tensor::new(&[label], &[1]))
}

fn model(network: bool) -> Model {
    let graph_layers: Vec<Arc<dyn Layer>> = if network {
        vec![Arc::new(
            GraphNetwork::new(
                "gnn",
                vec![
                    GraphConv::new("conv_0", 3, 4, Activation::Tanh, 1),
                    GraphConv::new("conv_1", 4, 4, Activation::Tanh, 3),
                ],
            )
            .unwrap(),
        )]
    } else {
        vec![
            Arc::new(GraphConv::new("conv_0", 3, 4, Activation::Tanh, 1)),
            Arc::new(GraphConv::new("conv_1", 4, 4, Activation::Tanh, 3)),
        ]
    };
    let mut layers = graph_layers;
    layers.push(Arc::new(Readout::new("readout", Pooling::Mean)));
    layers.push(Arc::new(Linear::new("head", 4, 1, Activation::Identity, 5)));
    Model::new(layers)
}

#[test]
fn test_unselected_graph_gets_zero_saliency() {
    let batch = GraphBatch::from(vec![graph(2, 1., 1), graph(3, 0., 2)]);
    for network in [false, true] {
        let saliency = Saliency::grad_cam(&model(network), ReduceMode::None).unwrap();
        let result = saliency.attribute(&batch).unwrap();
        let graphs = result.graphs().unwrap();

        // 两个图卷积块的输入宽度分别为3和4，拼接后为7
        let first = graphs[0].node(SALIENCY).unwrap();
        assert_eq!(first.shape(), &[2, 7]);
        assert!(first.to_vec().iter().any(|&v| v != 0.));

        let second = graphs[1].node(SALIENCY).unwrap();
        assert_eq!(second, &Tensor::zeros(&[3, 7]));
    }
}

#[test]
fn test_composite_and_flat_layers_agree() {
    // 同样权重的两种组织方式给出同样的归因
    let batch = GraphBatch::from(vec![graph(4, 1., 7), graph(2, 1., 8)]);
    let plain = Saliency::grad_cam(&model(false), ReduceMode::Mean)
        .unwrap()
        .raw_saliency(&batch)
        .unwrap();
    let composite = Saliency::build(
        &model(true),
        SaliencyConfig::new(MethodKind::GradCam).with_reduce_mode(ReduceMode::Mean),
    )
    .unwrap()
    .raw_saliency(&batch)
    .unwrap();
    assert_eq!(plain, composite);
    assert_eq!(plain.shape(), &[6, 7]);
}

#[test]
fn test_reduced_grad_cam_shape() {
    let batch = GraphBatch::from(vec![graph(4, 1., 7), graph(2, 0., 8)]);
    let saliency = Saliency::grad_cam(&model(false), ReduceMode::Sum).unwrap();
    let result = saliency.attribute(&batch).unwrap();
    assert_eq!(result.num_graphs(), 2);
    let graphs = result.graphs().unwrap();
    assert_eq!(graphs[0].node(SALIENCY).unwrap().shape(), &[4]);
    assert_eq!(graphs[1].node(SALIENCY).unwrap(), &Tensor::zeros(&[2]));
}

/// 只保留第0个图（首行）的预测
#[derive(Debug)]
struct FirstGraphOnly;

impl Layer for FirstGraphOnly {
    fn name(&self) -> &str {
        "first_graph_only"
    }

    fn forward(&self, input: &Value) -> Result<Value, SaliencyError> {
        Ok(Value::Dense(input.tensor()?.slice_rows(0, 1)))
    }

    fn backward(&self, input: &Value, _output: &Value, upstream: &Tensor) -> Result<Tensor, SaliencyError> {
        let shape = input.tensor()?.shape();
        let rest = Tensor::zeros(&[shape[0] - 1, shape[1]]);
        Ok(Tensor::concat(&[upstream, &rest], 0))
    }
}

#[test]
fn test_graph_outside_prediction_gets_zero_saliency() {
    let mut layers = vec![
        Arc::new(GraphConv::new("conv_0", 3, 4, Activation::Tanh, 1)) as Arc<dyn Layer>,
        Arc::new(GraphConv::new("conv_1", 4, 4, Activation::Tanh, 3)),
        Arc::new(Readout::new("readout", Pooling::Mean)),
        Arc::new(Linear::new("head", 4, 1, Activation::Identity, 5)),
    ];
    layers.push(Arc::new(FirstGraphOnly));
    let model = Model::new(layers);

    let batch = GraphBatch::from(vec![unlabeled(2, 1), unlabeled(3, 2)]);
    let saliency = Saliency::grad_cam(&model, ReduceMode::None).unwrap();
    let result = saliency.attribute(&batch).unwrap();
    let graphs = result.graphs().unwrap();

    let first = graphs[0].node(SALIENCY).unwrap();
    assert_eq!(first.shape(), &[2, 7]);
    assert!(first.to_vec().iter().any(|&v| v != 0.));
    assert_eq!(graphs[1].node(SALIENCY).unwrap(), &Tensor::zeros(&[3, 7]));
}
