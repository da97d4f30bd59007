/*
 * @Author       : 老董
 * @Date         : 2026-02-06
 * @Description  : 梯度带：记录每一次层的应用，之后按记录的逆序回放各层的VJP，
 *                 一次反向扫描即可得到目标对任意多个（已watch的）中间张量的梯度
 */

use std::collections::BTreeSet;

use super::{Layer, Value};
use crate::errors::SaliencyError;
use crate::tensor::Tensor;

/// 梯度带上某个值的句柄，只在创建它的梯度带内有效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(usize);

#[derive(Debug)]
struct Step<'m> {
    layer: &'m dyn Layer,
    input: TensorId,
    output: TensorId,
}

/// 反向模式求导的梯度带
///
/// 每次归因调用各自新建一个梯度带，因此它不需要是`Sync`的。
#[derive(Debug, Default)]
pub struct GradientTape<'m> {
    values: Vec<Value>,
    steps: Vec<Step<'m>>,
    watched: BTreeSet<TensorId>,
}

impl<'m> GradientTape<'m> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            steps: Vec::new(),
            watched: BTreeSet::new(),
        }
    }

    /// 登记一个外部输入
    pub fn constant(&mut self, value: Value) -> TensorId {
        self.values.push(value);
        TensorId(self.values.len() - 1)
    }

    /// 标记该张量需要求梯度（即使它是中间结果而非叶子输入）
    pub fn watch(&mut self, id: TensorId) {
        self.watched.insert(id);
    }

    pub fn is_watched(&self, id: TensorId) -> bool {
        self.watched.contains(&id)
    }

    /// 前向应用`layer`并记录下来
    pub fn apply(&mut self, layer: &'m dyn Layer, input: TensorId) -> Result<TensorId, SaliencyError> {
        let output = layer.forward(self.value(input)?)?;
        let output = self.constant(output);
        self.steps.push(Step {
            layer,
            input,
            output,
        });
        Ok(output)
    }

    pub fn value(&self, id: TensorId) -> Result<&Value, SaliencyError> {
        self.values
            .get(id.0)
            .ok_or_else(|| SaliencyError::Computation(format!("梯度带上不存在{id:?}")))
    }

    /// 计算`target`（以`cotangent`为种子，即对目标求和后的梯度）对`sources`中每个张量的梯度。
    ///
    /// 只做一次反向扫描。层都是一元的，每个张量至多经由一条记录到达目标，梯度直接沿该记录回传；
    /// 同一张量被多个层使用时，只有通向目标的那一支贡献梯度。
    /// `sources`中的张量须已被watch；目标不依赖的张量得到全零梯度。
    pub fn gradient(
        &self,
        target: TensorId,
        cotangent: &Tensor,
        sources: &[TensorId],
    ) -> Result<Vec<Tensor>, SaliencyError> {
        if let Some(id) = sources.iter().find(|id| !self.is_watched(**id)) {
            return Err(SaliencyError::Computation(format!(
                "{id:?}未被watch，不能对其求梯度"
            )));
        }
        let target_value = self.value(target)?.tensor()?;
        if !target_value.is_same_shape(cotangent) {
            return Err(SaliencyError::shape_mismatch(
                target_value.shape(),
                cotangent.shape(),
                "求导种子的形状须与目标张量一致",
            ));
        }

        let mut grads: Vec<Option<Tensor>> = vec![None; self.values.len()];
        grads[target.0] = Some(cotangent.clone());
        for step in self.steps.iter().rev() {
            let Some(upstream) = grads[step.output.0].as_ref() else {
                continue;
            };
            let grad = step.layer.backward(
                &self.values[step.input.0],
                &self.values[step.output.0],
                upstream,
            )?;
            grads[step.input.0] = Some(grad);
        }

        sources
            .iter()
            .map(|id| match &grads[id.0] {
                Some(grad) => Ok(grad.clone()),
                None => Ok(self.value(*id)?.tensor()?.zeros_like()),
            })
            .collect()
    }
}
