use super::{Attribution, feature_gradient};
use crate::errors::SaliencyError;
use crate::graph::FlatBatch;
use crate::nn::ModelView;
use crate::saliency::config::{Baseline, PathRule};
use crate::tensor::Tensor;

/// 积分梯度
///
/// 沿从基线`B`到特征`F`的直线路径取`steps`个点，对各点处的梯度取平均，再乘以`F - B`：
/// `IG = mean_i(grad(B + α_i·(F - B))) · (F - B)`，其中`α_i`由`path_rule`给出。
/// 每个点都用原始批次的标签选择目标。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratedGradients {
    steps: usize,
    baseline: Baseline,
    path_rule: PathRule,
}

impl IntegratedGradients {
    pub fn new(steps: usize, baseline: Baseline, path_rule: PathRule) -> Result<Self, SaliencyError> {
        if steps == 0 {
            return Err(SaliencyError::Configuration(
                "积分步数`steps`须为正整数".to_string(),
            ));
        }
        Ok(Self {
            steps,
            baseline,
            path_rule,
        })
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    pub fn path_rule(&self) -> PathRule {
        self.path_rule
    }
}

impl Attribution for IntegratedGradients {
    fn saliency(&self, scorer: &ModelView, graph: &FlatBatch) -> Result<Tensor, SaliencyError> {
        let feature = graph.node_feature()?;
        let baseline = self.baseline.tensor_like(feature);
        let diff = feature - &baseline;

        let mut total = feature.zeros_like();
        for step in 0..self.steps {
            let alpha = self.path_rule.fraction(step, self.steps);
            let interpolated = &baseline + &(alpha * &diff);
            let point = graph.clone().with_node_feature(interpolated)?;
            let (gradient, target) = feature_gradient(scorer, &point, graph)?;
            tracing::trace!(
                "积分梯度第{}/{}步：alpha={:.4}，目标值={:.6}",
                step + 1,
                self.steps,
                alpha,
                target.total()
            );
            total += &gradient;
        }
        Ok(total / self.steps as f32 * diff)
    }
}
