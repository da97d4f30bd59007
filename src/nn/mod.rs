/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 被归因模型的最小抽象：逐层前向 + 向量-雅可比积（VJP），
 *                 以及据此实现反向模式求导的梯度带（`GradientTape`）
 */

pub mod layer;
mod model;
mod tape;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::errors::SaliencyError;
use crate::graph::FlatBatch;
use crate::tensor::Tensor;

pub use layer::{Activation, Embedding, GraphConv, GraphNetwork, Init, Linear, Pooling, Readout};
pub use model::{Model, ModelView};
pub use tape::{GradientTape, TensorId};

/// 层与层之间流动的值
///
/// - `Graph`：扁平图批次，其可微部分为节点特征`feature`；
/// - `Dense`：普通稠密张量（如读出后的图级表示、模型预测）。
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Graph(FlatBatch),
    Dense(Tensor),
}

impl Value {
    /// 该值中可微的那个张量
    pub fn tensor(&self) -> Result<&Tensor, SaliencyError> {
        match self {
            Self::Graph(graph) => graph.node_feature(),
            Self::Dense(tensor) => Ok(tensor),
        }
    }

    pub fn as_graph(&self) -> Result<&FlatBatch, SaliencyError> {
        match self {
            Self::Graph(graph) => Ok(graph),
            Self::Dense(tensor) => Err(SaliencyError::Computation(format!(
                "此处需要图批次，实际为形状{:?}的稠密张量",
                tensor.shape()
            ))),
        }
    }

    pub fn is_graph(&self) -> bool {
        matches!(self, Self::Graph(_))
    }
}

/// 模型中的一层
///
/// 除了前向计算外，每层还须给出自己的向量-雅可比积：给定输出可微张量上的上游梯度，
/// 返回输入可微张量上的梯度（形状与输入可微张量一致）。
/// 层在构造后即冻结，任何方法都不会修改权重，因此同一模型可被多个线程同时使用。
///
/// 层的“种类”通过能力查询（`is_graph_conv`、`as_composite`）来区分，而不是具体类型。
pub trait Layer: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn forward(&self, input: &Value) -> Result<Value, SaliencyError>;

    /// 向量-雅可比积。`output`为`forward(input)`的结果
    fn backward(&self, input: &Value, output: &Value, upstream: &Tensor) -> Result<Tensor, SaliencyError>;

    /// 是否为图卷积（消息传递）层。模型会在第一个这样的层处切分
    fn is_graph_conv(&self) -> bool {
        false
    }

    /// 由多个图卷积块堆叠而成的复合层需返回`Some`，以便逐块记录中间特征
    fn as_composite(&self) -> Option<&dyn CompositeLayer> {
        None
    }
}

/// 复合层在梯度带上的前向入口
pub trait CompositeLayer {
    /// 在`tape`上逐块前向传播：每个内部图卷积块的输入特征都会被watch并记录。
    /// 返回最终输出以及按前向顺序记录的所有特征
    fn tape_forward<'m>(
        &'m self,
        tape: &mut GradientTape<'m>,
        input: TensorId,
    ) -> Result<(TensorId, Vec<TensorId>), SaliencyError>;
}
