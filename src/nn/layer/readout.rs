use crate::errors::SaliencyError;
use crate::nn::{Layer, Value};
use crate::tensor::{Tensor, segment_counts};

/// 读出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pooling {
    #[default]
    Mean,
    Sum,
}

/// 读出层：按所属图索引把节点特征池化为图级表示 [num_nodes, d] -> [num_graphs, d]
#[derive(Debug, Clone)]
pub struct Readout {
    name: String,
    pooling: Pooling,
}

impl Readout {
    pub fn new(name: &str, pooling: Pooling) -> Self {
        Self {
            name: name.to_string(),
            pooling,
        }
    }
}

impl Layer for Readout {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Value) -> Result<Value, SaliencyError> {
        let graph = input.as_graph()?;
        let x = graph.node_feature()?;
        let pooled = match self.pooling {
            Pooling::Mean => x.segment_mean(graph.graph_indicator(), graph.num_graphs())?,
            Pooling::Sum => x.segment_sum(graph.graph_indicator(), graph.num_graphs())?,
        };
        Ok(Value::Dense(pooled))
    }

    fn backward(&self, input: &Value, _output: &Value, upstream: &Tensor) -> Result<Tensor, SaliencyError> {
        // 每个节点拿到其所属图的上游梯度；均值池化时再除以该图的节点数
        let graph = input.as_graph()?;
        let indicator = graph.graph_indicator();
        let spread = upstream.gather_rows(indicator);
        match self.pooling {
            Pooling::Sum => Ok(spread),
            Pooling::Mean => {
                let counts = segment_counts(indicator, graph.num_graphs());
                let scale = indicator
                    .iter()
                    .map(|&g| 1.0 / counts[g] as f32)
                    .collect::<Vec<_>>();
                let mut shape = vec![1; spread.dimension()];
                shape[0] = indicator.len();
                Ok(spread * Tensor::new(&scale, &shape))
            }
        }
    }
}
