/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 内置层。足以表达“离散原子类型嵌入 -> 若干图卷积 -> 读出 -> 全连接”这类分子打分模型，
 *                 更特殊的结构可自行实现`Layer`/`CompositeLayer`
 */

mod embedding;
mod graph_conv;
mod graph_network;
mod linear;
mod readout;

pub use embedding::Embedding;
pub use graph_conv::GraphConv;
pub use graph_network::GraphNetwork;
pub use linear::Linear;
pub use readout::{Pooling, Readout};

use crate::errors::SaliencyError;
use crate::tensor::Tensor;

/// 逐元素激活函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Identity,
    Relu,
    Tanh,
    Sigmoid,
}

impl Activation {
    pub fn apply(&self, x: &Tensor) -> Tensor {
        match self {
            Self::Identity => x.clone(),
            Self::Relu => x.map(|v| v.max(0.0)),
            Self::Tanh => x.tanh(),
            Self::Sigmoid => x.map(|v| 1.0 / (1.0 + (-v).exp())),
        }
    }

    /// 用激活后的输出`y`表示的导数，省去保存激活前的值
    pub fn derivative_from_output(&self, y: &Tensor) -> Tensor {
        match self {
            Self::Identity => Tensor::ones(y.shape()),
            Self::Relu => y.map(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Self::Tanh => y.map(|v| 1.0 - v * v),
            Self::Sigmoid => y.map(|v| v * (1.0 - v)),
        }
    }
}

/// 参数初始化策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Init {
    /// 常数初始化
    Constant(f32),
    /// 全零
    Zeros,
    /// Xavier/Glorot 均匀初始化（适用于 Sigmoid/Tanh），带固定种子
    Xavier { seed: u64 },
}

impl Init {
    /// 生成形状为`shape`的参数，`shape[0]`视为fan_in，`shape[1]`视为fan_out
    pub fn generate(&self, shape: &[usize]) -> Tensor {
        match self {
            Self::Constant(v) => Tensor::full(*v, shape),
            Self::Zeros => Tensor::zeros(shape),
            Self::Xavier { seed } => {
                let (fan_in, fan_out) = (shape[0], shape.get(1).copied().unwrap_or(1));
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Tensor::new_random_seeded(-limit, limit, shape, *seed)
            }
        }
    }
}

/// 校验节点/样本特征为二维且列数等于`expected`
fn check_width(layer: &str, x: &Tensor, expected: usize) -> Result<(), SaliencyError> {
    if x.dimension() != 2 || x.shape()[1] != expected {
        return Err(SaliencyError::malformed(format!(
            "层`{layer}`期望形状为[*, {expected}]的特征，实际为{:?}",
            x.shape()
        )));
    }
    Ok(())
}

/// 校验权重形状（构造期）
fn check_weight(layer: &str, w: &Tensor, shape: &[usize]) -> Result<(), SaliencyError> {
    if w.shape() != shape {
        return Err(SaliencyError::Configuration(format!(
            "层`{layer}`的权重形状应为{shape:?}，实际为{:?}",
            w.shape()
        )));
    }
    Ok(())
}
