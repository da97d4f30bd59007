use crate::errors::TensorError;
use crate::tensor::Tensor;
use ndarray::{Axis, Ix2};

impl From<f32> for Tensor {
    /// 实现 From<f32> trait 用于将`f32`类型转换为形状为`[1]`的张量
    fn from(scalar: f32) -> Self {
        Tensor::new(&[scalar], &[1])
    }
}

impl Tensor {
    /// 对张量中的所有元素求和，按行优先顺序累加
    pub fn sum_all(&self) -> f32 {
        self.data.iter().sum()
    }

    /// 沿`axis`维度求和，结果比原张量少一个维度
    pub fn sum_axis(&self, axis: usize) -> Self {
        self.assert_axis(axis);
        Self::from_array(self.data.sum_axis(Axis(axis)))
    }

    /// 沿`axis`维度求均值，结果比原张量少一个维度。
    /// 若该维度长度为0，则结果为全NaN（与0/0一致）
    pub fn mean_axis(&self, axis: usize) -> Self {
        self.assert_axis(axis);
        let len = self.shape()[axis] as f32;
        Self::from_array(self.data.sum_axis(Axis(axis)) / len)
    }

    /// 沿最后一个维度归约
    pub fn sum_last_axis(&self) -> Self {
        self.sum_axis(self.dimension().saturating_sub(1))
    }

    pub fn mean_last_axis(&self) -> Self {
        self.mean_axis(self.dimension().saturating_sub(1))
    }

    /// 二维矩阵乘法：[m, n] x [n, p] -> [m, p]
    pub fn mat_mul(&self, other: &Self) -> Self {
        let lhs = self.as_matrix();
        let rhs = other.as_matrix();
        assert!(
            lhs.shape()[1] == rhs.shape()[0],
            "形状不一致，故无法矩阵相乘：第一个张量的形状为{:?}，第二个张量的形状为{:?}",
            self.shape(),
            other.shape()
        );
        Self::from_array(lhs.dot(&rhs).into_dyn())
    }

    /// 对每个元素应用`f`
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Self {
        Self::from_array(self.data.mapv(f))
    }

    pub fn tanh(&self) -> Self {
        self.map(f32::tanh)
    }

    fn as_matrix(&self) -> ndarray::ArrayView2<'_, f32> {
        assert!(
            self.dimension() == 2,
            "{}",
            TensorError::DimensionMismatch {
                expected: 2,
                got: self.dimension(),
            }
        );
        self.data
            .view()
            .into_dimensionality::<Ix2>()
            .unwrap_or_else(|e| panic!("{e}"))
    }

    fn assert_axis(&self, axis: usize) {
        assert!(
            axis < self.dimension(),
            "{}",
            TensorError::DimensionMismatch {
                expected: axis + 1,
                got: self.dimension(),
            }
        );
    }
}
