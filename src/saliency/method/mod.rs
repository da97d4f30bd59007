/*
 * @Author       : 老董
 * @Date         : 2026-02-09
 * @Description  : 三种归因算法。它们都接收嵌入后的扁平批次，返回未归约的逐节点逐特征归因
 */

mod grad_cam;
mod integrated;
mod vanilla;

pub use grad_cam::GradCam;
pub use integrated::IntegratedGradients;
pub use vanilla::VanillaGradient;

use enum_dispatch::enum_dispatch;

use super::target::{Target, select_target};
use crate::errors::SaliencyError;
use crate::graph::{FlatBatch, LABEL};
use crate::nn::{GradientTape, ModelView, TensorId, Value};
use crate::tensor::Tensor;

#[enum_dispatch]
pub trait Attribution {
    /// `graph`的节点特征即切分点处的连续表示；返回与之同形状的归因
    fn saliency(&self, scorer: &ModelView, graph: &FlatBatch) -> Result<Tensor, SaliencyError>;
}

#[enum_dispatch(Attribution)]
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Vanilla(VanillaGradient),
    Integrated(IntegratedGradients),
    GradCam(GradCam),
}

/// 在新的梯度带上对`graph`的节点特征求目标的梯度。
/// 目标总是依据`label_source`（原始批次）的标签来选，以便积分路径上的插值批次沿用同一标签
pub(crate) fn feature_gradient(
    scorer: &ModelView,
    graph: &FlatBatch,
    label_source: &FlatBatch,
) -> Result<(Tensor, Target), SaliencyError> {
    let mut tape = GradientTape::new();
    let x = tape.constant(Value::Graph(graph.clone()));
    tape.watch(x);
    let y = scorer.tape_forward(&mut tape, x)?;
    let target = target_on_tape(&tape, y, label_source)?;
    let mut gradients = tape.gradient(y, &target.cotangent, &[x])?;
    Ok((gradients.remove(0), target))
}

pub(crate) fn target_on_tape(
    tape: &GradientTape<'_>,
    prediction: TensorId,
    label_source: &FlatBatch,
) -> Result<Target, SaliencyError> {
    select_target(label_source.context(LABEL), tape.value(prediction)?.tensor()?)
}
