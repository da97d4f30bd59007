/*
 * @Author       : 老董
 * @Date         : 2026-02-07
 * @Description  : 图卷积（消息传递）层
 *
 * forward:  h' = act(h @ W_self + A·h @ W_neighbor + b)
 *           其中 (A·h)[v] = Σ_{u->v} h[u]，即按边把起点特征gather出来，再按终点segment_sum
 * backward: dz = upstream * act'(h')
 *           dh = dz @ W_self^T + A^T·(dz @ W_neighbor^T)
 *           A^T 的作用与 A 相反：按终点gather，再按起点segment_sum
 */

use super::{Activation, Init, check_weight, check_width};
use crate::errors::SaliencyError;
use crate::graph::FlatBatch;
use crate::nn::{Layer, Value};
use crate::tensor::Tensor;

#[derive(Debug, Clone)]
pub struct GraphConv {
    name: String,
    /// [in, out]
    self_weights: Tensor,
    /// [in, out]
    neighbor_weights: Tensor,
    /// [out]
    bias: Tensor,
    activation: Activation,
}

impl GraphConv {
    pub fn new(
        name: &str,
        in_features: usize,
        out_features: usize,
        activation: Activation,
        seed: u64,
    ) -> Self {
        let shape = [in_features, out_features];
        Self {
            name: name.to_string(),
            self_weights: Init::Xavier { seed }.generate(&shape),
            neighbor_weights: Init::Xavier {
                seed: seed.wrapping_add(1),
            }
            .generate(&shape),
            bias: Init::Zeros.generate(&[out_features]),
            activation,
        }
    }

    pub fn from_weights(
        name: &str,
        self_weights: Tensor,
        neighbor_weights: Tensor,
        bias: Option<Tensor>,
        activation: Activation,
    ) -> Result<Self, SaliencyError> {
        if self_weights.dimension() != 2 {
            return Err(SaliencyError::Configuration(format!(
                "层`{name}`的权重须为二维，实际为{:?}",
                self_weights.shape()
            )));
        }
        check_weight(name, &neighbor_weights, self_weights.shape())?;
        let out_features = self_weights.shape()[1];
        let bias = bias.unwrap_or_else(|| Tensor::zeros(&[out_features]));
        check_weight(name, &bias, &[out_features])?;
        Ok(Self {
            name: name.to_string(),
            self_weights,
            neighbor_weights,
            bias,
            activation,
        })
    }

    pub fn in_features(&self) -> usize {
        self.self_weights.shape()[0]
    }

    pub fn out_features(&self) -> usize {
        self.self_weights.shape()[1]
    }
}

/// 按边把`x`的起点行累加到终点行
fn propagate(x: &Tensor, graph: &FlatBatch) -> Result<Tensor, SaliencyError> {
    x.gather_rows(graph.source())
        .segment_sum(graph.target(), graph.num_nodes())
}

/// `propagate`的转置
fn propagate_transposed(x: &Tensor, graph: &FlatBatch) -> Result<Tensor, SaliencyError> {
    x.gather_rows(graph.target())
        .segment_sum(graph.source(), graph.num_nodes())
}

impl Layer for GraphConv {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Value) -> Result<Value, SaliencyError> {
        let graph = input.as_graph()?;
        let h = graph.node_feature()?;
        check_width(&self.name, h, self.in_features())?;

        let aggregated = propagate(h, graph)?;
        let z = h.mat_mul(&self.self_weights)
            + aggregated.mat_mul(&self.neighbor_weights)
            + &self.bias;
        let feature = self.activation.apply(&z);
        Ok(Value::Graph(graph.clone().with_node_feature(feature)?))
    }

    fn backward(&self, input: &Value, output: &Value, upstream: &Tensor) -> Result<Tensor, SaliencyError> {
        let graph = input.as_graph()?;
        let dz = upstream * &self.activation.derivative_from_output(output.tensor()?);
        let from_self = dz.mat_mul(&self.self_weights.transpose());
        let from_neighbors =
            propagate_transposed(&dz.mat_mul(&self.neighbor_weights.transpose()), graph)?;
        Ok(from_self + from_neighbors)
    }

    fn is_graph_conv(&self) -> bool {
        true
    }
}
