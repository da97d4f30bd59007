use crate::errors::SaliencyError;
use crate::tensor::Tensor;

/// 求导目标
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    /// 被选中的预测值，按行优先顺序排成一维
    pub values: Tensor,
    /// 目标（求和后）对整个预测张量的梯度，即反向传播的种子：被选中处为1，其余为0
    pub cotangent: Tensor,
}

impl Target {
    /// 目标值之和，即实际被求导的标量
    pub fn total(&self) -> f32 {
        self.values.sum_all()
    }
}

/// 由（可选的）标签与预测选出求导目标
///
/// - 标签存在且为多值（阶数大于1，如多任务/多分类的one-hot）时，只选取标签非零位置上的预测；
/// - 无标签、标签为单值，或标签全为零时，退回到整个预测。
///
/// 多值标签与预测形状不一致时视为批次不合法。
pub fn select_target(label: Option<&Tensor>, prediction: &Tensor) -> Result<Target, SaliencyError> {
    if let Some(label) = label.filter(|l| l.dimension() > 1) {
        if !label.is_same_shape(prediction) {
            return Err(SaliencyError::malformed(format!(
                "标签形状{:?}与预测形状{:?}不一致，无法据此选择目标",
                label.shape(),
                prediction.shape()
            )));
        }
        let positions = label.nonzero_positions();
        if !positions.is_empty() {
            let data = prediction.to_vec();
            let values = positions.iter().map(|&i| data[i]).collect::<Vec<_>>();
            return Ok(Target {
                values: Tensor::new(&values, &[values.len()]),
                cotangent: label.nonzero_mask(),
            });
        }
        tracing::debug!("标签中没有非零项，退回到以整个预测为目标");
    }
    Ok(Target {
        values: prediction.reshape(&[prediction.size()]),
        cotangent: Tensor::ones(prediction.shape()),
    })
}
