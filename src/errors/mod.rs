use thiserror::Error;

/// 张量内部的不变量错误。
/// 张量运算遇到这些情况时直接panic，该枚举仅用于生成panic消息。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TensorError {
    #[error("张量列表为空")]
    EmptyList,
    #[error("张量形状不一致")]
    InconsistentShape,
    #[error("张量形状不兼容")]
    IncompatibleShape,
    #[error("数据长度{data_len}与形状{shape:?}不匹配")]
    DataShapeMismatch { data_len: usize, shape: Vec<usize> },
    #[error("该运算需要{expected}维张量，实际为{got}维")]
    DimensionMismatch { expected: usize, got: usize },
}

/// 归因引擎对外暴露的错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaliencyError {
    /// 模型或配置无法构建归因引擎（如找不到图卷积层、`steps`为0）
    #[error("配置错误：{0}")]
    Configuration(String),
    /// 图批次不合法（空图、所属图索引非法、属性形状不一致等）
    #[error("图批次格式错误：{0}")]
    MalformedBatch(String),
    /// 张量列表或形状不一致，通常意味着不受支持的模型拓扑
    #[error("形状不一致：期望{expected:?}，实际{got:?}。{message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },
    /// 梯度带使用错误
    #[error("计算错误：{0}")]
    Computation(String),
}

impl SaliencyError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedBatch(message.into())
    }

    pub(crate) fn shape_mismatch(expected: &[usize], got: &[usize], message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
            message: message.into(),
        }
    }
}
