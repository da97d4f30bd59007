use super::Init;
use crate::errors::SaliencyError;
use crate::nn::{Layer, Value};
use crate::tensor::Tensor;

/// 离散节点类型（如原子序号）的嵌入层
///
/// 输入节点特征形状为 [num_nodes] 或 [num_nodes, 1]，元素为类型编号；
/// 输出为查表得到的 [num_nodes, dim]。输入是离散的，对其求导没有意义，
/// `backward`恒返回零梯度，这也是模型要在其后的第一个图卷积层处切分的原因。
#[derive(Debug, Clone)]
pub struct Embedding {
    name: String,
    /// [num_types, dim]
    table: Tensor,
}

impl Embedding {
    pub fn new(name: &str, num_types: usize, dim: usize, seed: u64) -> Self {
        Self {
            name: name.to_string(),
            table: Init::Xavier { seed }.generate(&[num_types, dim]),
        }
    }

    pub fn from_table(name: &str, table: Tensor) -> Result<Self, SaliencyError> {
        if table.dimension() != 2 || table.rows() == 0 {
            return Err(SaliencyError::Configuration(format!(
                "层`{name}`的嵌入表须为非空二维张量，实际为{:?}",
                table.shape()
            )));
        }
        Ok(Self {
            name: name.to_string(),
            table,
        })
    }

    fn lookup_indices(&self, feature: &Tensor) -> Result<Vec<usize>, SaliencyError> {
        let column = feature.dimension() == 1 || (feature.dimension() == 2 && feature.shape()[1] == 1);
        if !column {
            return Err(SaliencyError::malformed(format!(
                "层`{}`期望形状为[n]或[n, 1]的类型编号，实际为{:?}",
                self.name,
                feature.shape()
            )));
        }
        let num_types = self.table.rows();
        feature
            .to_vec()
            .into_iter()
            .map(|v| {
                if v >= 0.0 && v.fract() == 0.0 && (v as usize) < num_types {
                    Ok(v as usize)
                } else {
                    Err(SaliencyError::malformed(format!(
                        "层`{}`遇到非法的类型编号{v}（应为[0, {num_types})内的整数）",
                        self.name
                    )))
                }
            })
            .collect()
    }
}

impl Layer for Embedding {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Value) -> Result<Value, SaliencyError> {
        let graph = input.as_graph()?;
        let indices = self.lookup_indices(graph.node_feature()?)?;
        let feature = self.table.gather_rows(&indices);
        Ok(Value::Graph(graph.clone().with_node_feature(feature)?))
    }

    fn backward(&self, input: &Value, _output: &Value, _upstream: &Tensor) -> Result<Tensor, SaliencyError> {
        Ok(input.tensor()?.zeros_like())
    }
}
