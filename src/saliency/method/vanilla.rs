use super::{Attribution, feature_gradient};
use crate::errors::SaliencyError;
use crate::graph::FlatBatch;
use crate::nn::ModelView;
use crate::tensor::Tensor;

/// 原始梯度：目标对嵌入后节点特征的梯度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VanillaGradient;

impl Attribution for VanillaGradient {
    fn saliency(&self, scorer: &ModelView, graph: &FlatBatch) -> Result<Tensor, SaliencyError> {
        let (gradient, _) = feature_gradient(scorer, graph, graph)?;
        Ok(gradient)
    }
}
