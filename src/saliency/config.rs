/*
 * @Author       : 老董
 * @Date         : 2026-02-09
 * @Description  : 归因引擎的配置。可序列化为JSON，便于与模型一同保存/加载
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::SaliencyError;
use crate::tensor::Tensor;

/// 最终归因在特征维上的归约方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceMode {
    /// 保留完整的特征向量
    None,
    Sum,
    #[default]
    Mean,
}

impl ReduceMode {
    /// 沿最后一个维度归约
    pub fn reduce(&self, saliency: Tensor) -> Tensor {
        match self {
            Self::None => saliency,
            Self::Sum => saliency.sum_last_axis(),
            Self::Mean => saliency.mean_last_axis(),
        }
    }
}

impl FromStr for ReduceMode {
    type Err = SaliencyError;

    /// 宽松解析：空串或`none`为不归约，以`sum`开头的为求和，其余一律取均值
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Ok(if s.is_empty() || s == "none" {
            Self::None
        } else if s.starts_with("sum") {
            Self::Sum
        } else {
            Self::Mean
        })
    }
}

impl fmt::Display for ReduceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Sum => "sum",
            Self::Mean => "mean",
        };
        write!(f, "{name}")
    }
}

/// 归因算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// 原始梯度
    #[default]
    Vanilla,
    /// 积分梯度
    Integrated,
    /// 多层Grad-CAM
    GradCam,
}

/// 积分梯度的基线
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    #[default]
    Zeros,
    /// 所有元素取同一常数
    Constant(f32),
}

impl Baseline {
    /// 生成与`feature`同形状的基线张量
    pub fn tensor_like(&self, feature: &Tensor) -> Tensor {
        match self {
            Self::Zeros => feature.zeros_like(),
            Self::Constant(value) => Tensor::full(*value, feature.shape()),
        }
    }
}

/// 黎曼和在每个小区间内取点的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathRule {
    /// 第i步取 i / steps
    #[default]
    Left,
    /// 第i步取 (i + 0.5) / steps
    Midpoint,
}

impl PathRule {
    pub fn fraction(&self, step: usize, steps: usize) -> f32 {
        match self {
            Self::Left => step as f32 / steps as f32,
            Self::Midpoint => (step as f32 + 0.5) / steps as f32,
        }
    }
}

pub const DEFAULT_STEPS: usize = 50;

fn default_steps() -> usize {
    DEFAULT_STEPS
}

/// 归因引擎的完整配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaliencyConfig {
    #[serde(default)]
    pub method: MethodKind,
    #[serde(default)]
    pub reduce_mode: ReduceMode,
    /// 积分步数，只对积分梯度有效，须为正
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default)]
    pub baseline: Baseline,
    #[serde(default)]
    pub path_rule: PathRule,
}

impl Default for SaliencyConfig {
    fn default() -> Self {
        Self {
            method: MethodKind::default(),
            reduce_mode: ReduceMode::default(),
            steps: DEFAULT_STEPS,
            baseline: Baseline::default(),
            path_rule: PathRule::default(),
        }
    }
}

impl SaliencyConfig {
    pub fn new(method: MethodKind) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_reduce_mode(mut self, reduce_mode: ReduceMode) -> Self {
        self.reduce_mode = reduce_mode;
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_path_rule(mut self, path_rule: PathRule) -> Self {
        self.path_rule = path_rule;
        self
    }

    pub fn validate(&self) -> Result<(), SaliencyError> {
        if self.steps == 0 {
            return Err(SaliencyError::Configuration(
                "积分步数`steps`须为正整数".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, SaliencyError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SaliencyError::Configuration(format!("无法解析配置：{e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, SaliencyError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SaliencyError::Configuration(format!("无法序列化配置：{e}")))
    }
}
