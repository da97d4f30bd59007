/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : Linear (全连接) 层
 */

use super::{Activation, Init, check_weight, check_width};
use crate::errors::SaliencyError;
use crate::nn::{Layer, Value};
use crate::tensor::Tensor;

/// 全连接层：`output = act(x @ W + b)`
///
/// # 输入/输出形状
/// - 图批次：逐节点作用于节点特征 [num_nodes, in] -> [num_nodes, out]，其余属性不变
/// - 稠密张量：[batch_size, in] -> [batch_size, out]
#[derive(Debug, Clone)]
pub struct Linear {
    name: String,
    /// 权重参数 [in_features, out_features]
    weights: Tensor,
    /// 偏置参数 [out_features]
    bias: Tensor,
    activation: Activation,
}

impl Linear {
    /// 创建新的 Linear 层：Xavier 初始化权重，零初始化偏置
    pub fn new(
        name: &str,
        in_features: usize,
        out_features: usize,
        activation: Activation,
        seed: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            weights: Init::Xavier { seed }.generate(&[in_features, out_features]),
            bias: Init::Zeros.generate(&[out_features]),
            activation,
        }
    }

    /// 用给定参数创建（如加载训练好的权重）。`bias`为`None`时取零
    pub fn from_weights(
        name: &str,
        weights: Tensor,
        bias: Option<Tensor>,
        activation: Activation,
    ) -> Result<Self, SaliencyError> {
        if weights.dimension() != 2 {
            return Err(SaliencyError::Configuration(format!(
                "层`{name}`的权重须为二维，实际为{:?}",
                weights.shape()
            )));
        }
        let out_features = weights.shape()[1];
        let bias = bias.unwrap_or_else(|| Tensor::zeros(&[out_features]));
        check_weight(name, &bias, &[out_features])?;
        Ok(Self {
            name: name.to_string(),
            weights,
            bias,
            activation,
        })
    }

    pub fn in_features(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn out_features(&self) -> usize {
        self.weights.shape()[1]
    }

    fn affine(&self, x: &Tensor) -> Result<Tensor, SaliencyError> {
        check_width(&self.name, x, self.in_features())?;
        let z = x.mat_mul(&self.weights) + &self.bias;
        Ok(self.activation.apply(&z))
    }
}

impl Layer for Linear {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Value) -> Result<Value, SaliencyError> {
        match input {
            Value::Graph(graph) => {
                let feature = self.affine(graph.node_feature()?)?;
                Ok(Value::Graph(graph.clone().with_node_feature(feature)?))
            }
            Value::Dense(x) => Ok(Value::Dense(self.affine(x)?)),
        }
    }

    fn backward(&self, _input: &Value, output: &Value, upstream: &Tensor) -> Result<Tensor, SaliencyError> {
        // dz = upstream * act'(z)；dx = dz @ W^T
        let local = self.activation.derivative_from_output(output.tensor()?);
        let dz = upstream * &local;
        Ok(dz.mat_mul(&self.weights.transpose()))
    }
}
