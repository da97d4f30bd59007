/*
 * @Author       : 老董
 * @Date         : 2026-02-09
 * @Description  : 图归因引擎：在第一个图卷积层处切分模型，对嵌入后的节点特征做归因，
 *                 并把（归约后的）结果作为节点属性`saliency`挂回原批次
 */

pub mod config;
pub mod method;
mod target;

#[cfg(test)]
mod tests;

pub use config::{Baseline, DEFAULT_STEPS, MethodKind, PathRule, ReduceMode, SaliencyConfig};
pub use method::{Attribution, GradCam, IntegratedGradients, Method, VanillaGradient};
pub use target::{Target, select_target};

use crate::errors::SaliencyError;
use crate::graph::{FlatBatch, GraphBatch, SALIENCY};
use crate::nn::{Model, ModelView, Value};
use crate::tensor::Tensor;

/// 归因引擎
///
/// 构造后只读，`attribute`可在多个线程上并发调用。
#[derive(Debug, Clone)]
pub struct Saliency {
    embedder: ModelView,
    scorer: ModelView,
    config: SaliencyConfig,
    method: Method,
}

impl Saliency {
    pub fn build(model: &Model, config: SaliencyConfig) -> Result<Self, SaliencyError> {
        config.validate()?;
        let (embedder, scorer) = model.split_at_graph_conv()?;
        let method = match config.method {
            MethodKind::Vanilla => Method::from(VanillaGradient),
            MethodKind::Integrated => Method::from(IntegratedGradients::new(
                config.steps,
                config.baseline,
                config.path_rule,
            )?),
            MethodKind::GradCam => Method::from(GradCam),
        };
        tracing::debug!(
            "构建归因引擎：方法={:?}，归约={}，嵌入部分{}层，打分部分{}层",
            config.method,
            config.reduce_mode,
            embedder.len(),
            scorer.len()
        );
        Ok(Self {
            embedder,
            scorer,
            config,
            method,
        })
    }

    /// 原始梯度
    pub fn vanilla(model: &Model, reduce_mode: ReduceMode) -> Result<Self, SaliencyError> {
        Self::build(
            model,
            SaliencyConfig::new(MethodKind::Vanilla).with_reduce_mode(reduce_mode),
        )
    }

    /// 积分梯度（零基线，左端点规则）
    pub fn integrated(
        model: &Model,
        reduce_mode: ReduceMode,
        steps: usize,
    ) -> Result<Self, SaliencyError> {
        Self::build(
            model,
            SaliencyConfig::new(MethodKind::Integrated)
                .with_reduce_mode(reduce_mode)
                .with_steps(steps),
        )
    }

    /// 多层Grad-CAM
    pub fn grad_cam(model: &Model, reduce_mode: ReduceMode) -> Result<Self, SaliencyError> {
        Self::build(
            model,
            SaliencyConfig::new(MethodKind::GradCam).with_reduce_mode(reduce_mode),
        )
    }

    pub fn config(&self) -> &SaliencyConfig {
        &self.config
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn embedder(&self) -> &ModelView {
        &self.embedder
    }

    pub fn scorer(&self) -> &ModelView {
        &self.scorer
    }

    /// 把批次送入嵌入部分，得到切分点处的扁平批次
    pub fn embed(&self, batch: &GraphBatch) -> Result<FlatBatch, SaliencyError> {
        match self.embedder.forward(Value::Graph(batch.flatten()?))? {
            Value::Graph(graph) => Ok(graph),
            Value::Dense(tensor) => Err(SaliencyError::Computation(format!(
                "嵌入部分的输出应为图批次，实际为形状{:?}的稠密张量",
                tensor.shape()
            ))),
        }
    }

    /// 未归约的归因，形状与嵌入后的节点特征相同
    pub fn raw_saliency(&self, batch: &GraphBatch) -> Result<Tensor, SaliencyError> {
        let embedded = self.embed(batch)?;
        self.method.saliency(&self.scorer, &embedded)
    }

    /// 计算归因并以节点属性`saliency`挂回批次，返回的批次与输入表示形式相同。
    /// 输入批次本身不被修改
    pub fn attribute(&self, batch: &GraphBatch) -> Result<GraphBatch, SaliencyError> {
        let saliency = self.config.reduce_mode.reduce(self.raw_saliency(batch)?);
        tracing::debug!(
            "完成归因：{}个图，{}个节点，结果形状{:?}",
            batch.num_graphs(),
            batch.num_nodes(),
            saliency.shape()
        );
        batch.with_node_attribute(SALIENCY, saliency)
    }
}
