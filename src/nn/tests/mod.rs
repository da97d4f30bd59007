use approx::assert_abs_diff_eq;

use crate::graph::{FlatBatch, Graph};
use crate::nn::{Layer, Value};
use crate::tensor::Tensor;

mod tape;

/// 两个图（3节点链 + 2节点对），节点特征宽度为`dim`，特征随机但可复现
fn two_graph_batch(dim: usize, seed: u64) -> FlatBatch {
    let a = Graph::new(Tensor::new_random_seeded(-1., 1., &[3, dim], seed))
        .unwrap()
        .with_edges(vec![0, 1, 1, 2], vec![1, 0, 2, 1])
        .unwrap();
    let b = Graph::new(Tensor::new_random_seeded(-1., 1., &[2, dim], seed + 1))
        .unwrap()
        .with_edges(vec![0, 1], vec![1, 0])
        .unwrap();
    FlatBatch::from_graphs(&[a, b]).unwrap()
}

/// 以中心差分数值地求 `sum(layer(x) * weights)` 对输入可微张量的梯度
fn numeric_gradient(layer: &dyn Layer, input: &Value, weights: &Tensor) -> Tensor {
    const EPS: f32 = 1e-2;
    let objective = |x: Tensor| -> f32 {
        let value = match input {
            Value::Graph(graph) => Value::Graph(graph.clone().with_node_feature(x).unwrap()),
            Value::Dense(_) => Value::Dense(x),
        };
        let output = layer.forward(&value).unwrap();
        (output.tensor().unwrap() * weights).sum_all()
    };

    let x = input.tensor().unwrap();
    let shape = x.shape().to_vec();
    let data = x.to_vec();
    let grad = (0..data.len())
        .map(|i| {
            let mut plus = data.clone();
            let mut minus = data.clone();
            plus[i] += EPS;
            minus[i] -= EPS;
            (objective(Tensor::new(&plus, &shape)) - objective(Tensor::new(&minus, &shape)))
                / (2. * EPS)
        })
        .collect::<Vec<_>>();
    Tensor::new(&grad, &shape)
}

/// 比较层的`backward`与数值梯度
fn check_vjp(layer: &dyn Layer, input: &Value, seed: u64) {
    let output = layer.forward(input).unwrap();
    let weights = Tensor::new_random_seeded(-1., 1., output.tensor().unwrap().shape(), seed);
    let analytic = layer.backward(input, &output, &weights).unwrap();
    let numeric = numeric_gradient(layer, input, &weights);

    assert_eq!(analytic.shape(), input.tensor().unwrap().shape());
    for (a, n) in analytic.to_vec().iter().zip(numeric.to_vec()) {
        assert_abs_diff_eq!(*a, n, epsilon = 2e-3);
    }
}
