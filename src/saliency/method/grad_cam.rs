use super::{Attribution, target_on_tape};
use crate::errors::SaliencyError;
use crate::graph::FlatBatch;
use crate::nn::{GradientTape, ModelView, TensorId, Value};
use crate::tensor::Tensor;

/// 多层Grad-CAM
///
/// 在一次前向中记录每个图卷积块的输入节点特征（复合层则逐个内部块记录），
/// 一次反向得到目标对它们全部的梯度。特征与梯度分别沿特征维拼接后：
/// - 每个图、每个特征通道的权重 = 该图内所有节点上梯度的均值；
/// - 梯度非零处取`权重 × 特征`，梯度为零处保留梯度本身（即0）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GradCam;

impl GradCam {
    /// 在梯度带上前向，返回模型输出与被记录的特征
    fn record<'m>(
        scorer: &'m ModelView,
        tape: &mut GradientTape<'m>,
        input: TensorId,
    ) -> Result<(TensorId, Vec<TensorId>), SaliencyError> {
        let mut x = input;
        let mut features = Vec::new();
        for layer in scorer.layers() {
            if let Some(composite) = layer.as_composite() {
                let (output, recorded) = composite.tape_forward(tape, x)?;
                features.extend(recorded);
                x = output;
                continue;
            }
            if layer.is_graph_conv() && tape.value(x)?.is_graph() {
                tape.watch(x);
                features.push(x);
            }
            x = tape.apply(&**layer, x)?;
        }
        Ok((x, features))
    }
}

impl Attribution for GradCam {
    fn saliency(&self, scorer: &ModelView, graph: &FlatBatch) -> Result<Tensor, SaliencyError> {
        let mut tape = GradientTape::new();
        let input = tape.constant(Value::Graph(graph.clone()));
        let (output, recorded) = Self::record(scorer, &mut tape, input)?;
        if recorded.is_empty() {
            return Err(SaliencyError::shape_mismatch(
                &[graph.num_nodes()],
                &[],
                "没有记录到任何图卷积特征，无法拼接",
            ));
        }

        let target = target_on_tape(&tape, output, graph)?;
        let gradients = tape.gradient(output, &target.cotangent, &recorded)?;
        let features = recorded
            .iter()
            .map(|&id| tape.value(id)?.tensor())
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("Grad-CAM记录了{}个图卷积特征", features.len());

        let num_nodes = graph.num_nodes();
        for tensor in features.iter().copied().chain(gradients.iter()) {
            if tensor.dimension() != 2 || tensor.rows() != num_nodes {
                return Err(SaliencyError::shape_mismatch(
                    &[num_nodes],
                    tensor.shape(),
                    "各图卷积特征须为行数等于节点总数的二维张量",
                ));
            }
        }

        let features = Tensor::concat(&features, 1);
        let gradients = Tensor::concat(&gradients.iter().collect::<Vec<_>>(), 1);
        let indicator = graph.graph_indicator();
        let weights = gradients
            .segment_mean(indicator, graph.num_graphs())?
            .gather_rows(indicator);
        let weighted = weights * &features;
        Ok(gradients.where_with_tensor(&weighted, |g, _| g != 0.0, |_, w| w, |g, _| g))
    }
}
