use super::GraphConv;
use crate::errors::SaliencyError;
use crate::nn::{CompositeLayer, GradientTape, Layer, TensorId, Value};
use crate::tensor::Tensor;

/// 多个`GraphConv`块顺序堆叠而成的复合层
///
/// 作为一个整体它本身也是图卷积层（模型可在它之前切分）；
/// 同时它实现了`CompositeLayer`，使Grad-CAM能看到每个内部块的输入特征。
#[derive(Debug, Clone)]
pub struct GraphNetwork {
    name: String,
    blocks: Vec<GraphConv>,
}

impl GraphNetwork {
    pub fn new(name: &str, blocks: Vec<GraphConv>) -> Result<Self, SaliencyError> {
        if blocks.is_empty() {
            return Err(SaliencyError::Configuration(format!(
                "复合层`{name}`至少需要一个图卷积块"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            blocks,
        })
    }

    pub fn blocks(&self) -> &[GraphConv] {
        &self.blocks
    }
}

impl Layer for GraphNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn forward(&self, input: &Value) -> Result<Value, SaliencyError> {
        self.blocks
            .iter()
            .try_fold(input.clone(), |x, block| block.forward(&x))
    }

    fn backward(&self, input: &Value, _output: &Value, upstream: &Tensor) -> Result<Tensor, SaliencyError> {
        // 重新前向一遍以取得各块的中间结果，再逆序串联各块的VJP
        let mut values = vec![input.clone()];
        for block in &self.blocks {
            let next = block.forward(&values[values.len() - 1])?;
            values.push(next);
        }
        self.blocks
            .iter()
            .enumerate()
            .rev()
            .try_fold(upstream.clone(), |grad, (i, block)| {
                block.backward(&values[i], &values[i + 1], &grad)
            })
    }

    fn is_graph_conv(&self) -> bool {
        true
    }

    fn as_composite(&self) -> Option<&dyn CompositeLayer> {
        Some(self)
    }
}

impl CompositeLayer for GraphNetwork {
    fn tape_forward<'m>(
        &'m self,
        tape: &mut GradientTape<'m>,
        input: TensorId,
    ) -> Result<(TensorId, Vec<TensorId>), SaliencyError> {
        let mut recorded = Vec::with_capacity(self.blocks.len());
        let mut x = input;
        for block in &self.blocks {
            tape.watch(x);
            recorded.push(x);
            x = tape.apply(block, x)?;
        }
        Ok((x, recorded))
    }
}
