/*
 * @Author       : 老董
 * @Date         : 2026-02-07
 * @Description  : 训练好的（冻结的）顺序模型，以及在图卷积边界处的切分
 */

use std::ops::Range;
use std::sync::Arc;

use super::{GradientTape, Layer, TensorId, Value};
use crate::errors::SaliencyError;
use crate::graph::GraphBatch;
use crate::tensor::Tensor;

/// 按构造顺序排列的层序列。层被`Arc`共享，构造后不再修改
#[derive(Debug, Clone)]
pub struct Model {
    layers: Arc<[Arc<dyn Layer>]>,
}

impl Model {
    pub fn new(layers: Vec<Arc<dyn Layer>>) -> Self {
        Self {
            layers: Arc::from(layers),
        }
    }

    pub fn layers(&self) -> &[Arc<dyn Layer>] {
        &self.layers
    }

    /// 覆盖全部层的视图
    pub fn view(&self) -> ModelView {
        ModelView {
            layers: Arc::clone(&self.layers),
            range: 0..self.layers.len(),
        }
    }

    /// 对一个批次做预测，返回最后一层输出的可微张量
    pub fn predict(&self, batch: &GraphBatch) -> Result<Tensor, SaliencyError> {
        let output = self.view().forward(Value::Graph(batch.flatten()?))?;
        Ok(output.tensor()?.clone())
    }

    /// 在第一个图卷积层处把模型切成`(embedder, scorer)`：
    /// embedder 把原始输入映射到该层的输入，scorer 从该层的输入算到模型输出，
    /// 满足`scorer(embedder(x)) == model(x)`。两者共享同一份层序列，不复制权重
    pub fn split_at_graph_conv(&self) -> Result<(ModelView, ModelView), SaliencyError> {
        let index = self
            .layers
            .iter()
            .position(|layer| layer.is_graph_conv())
            .ok_or_else(|| {
                SaliencyError::Configuration("模型中找不到图卷积层，无法确定切分点".to_string())
            })?;
        tracing::debug!(
            "在第{}层`{}`处切分模型（共{}层）",
            index,
            self.layers[index].name(),
            self.layers.len()
        );
        Ok((
            ModelView {
                layers: Arc::clone(&self.layers),
                range: 0..index,
            },
            ModelView {
                layers: Arc::clone(&self.layers),
                range: index..self.layers.len(),
            },
        ))
    }
}

/// 共享层序列上的一段连续只读视图
#[derive(Debug, Clone)]
pub struct ModelView {
    layers: Arc<[Arc<dyn Layer>]>,
    range: Range<usize>,
}

impl ModelView {
    pub fn layers(&self) -> &[Arc<dyn Layer>] {
        &self.layers[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// 推理（不记录梯度）。空视图原样返回输入
    pub fn forward(&self, input: Value) -> Result<Value, SaliencyError> {
        self.layers()
            .iter()
            .try_fold(input, |x, layer| layer.forward(&x))
    }

    /// 在梯度带上逐层前向，返回输出的句柄
    pub fn tape_forward<'m>(
        &'m self,
        tape: &mut GradientTape<'m>,
        input: TensorId,
    ) -> Result<TensorId, SaliencyError> {
        self.layers()
            .iter()
            .try_fold(input, |x, layer| tape.apply(&**layer, x))
    }
}
