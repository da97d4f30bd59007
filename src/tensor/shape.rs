use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Axis, Slice};

impl Tensor {
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let new_total_elements: usize = shape.iter().product();
        assert!(
            self.size() == new_total_elements,
            "{}",
            TensorError::IncompatibleShape
        );
        Self::new(&self.to_vec(), shape)
    }

    /// 二维张量的转置；更高维度时反转所有轴
    pub fn transpose(&self) -> Self {
        Self::from_array(self.data.t().to_owned())
    }

    /// 沿已有的`axis`维度拼接多个张量，除`axis`外其余维度须一致，否则panic
    pub fn concat(tensors: &[&Self], axis: usize) -> Self {
        assert!(!tensors.is_empty(), "{}", TensorError::EmptyList);
        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        let data = ndarray::concatenate(Axis(axis), &views)
            .unwrap_or_else(|_| panic!("{}", TensorError::InconsistentShape));
        Self::from_array(data)
    }

    /// 沿新增的首个维度堆叠多个形状一致的张量。如：3个形状为[2]的张量堆叠为[3, 2]
    pub fn stack(tensors: &[&Self]) -> Self {
        assert!(!tensors.is_empty(), "{}", TensorError::EmptyList);
        let views = tensors.iter().map(|t| t.data.view()).collect::<Vec<_>>();
        let data = ndarray::stack(Axis(0), &views)
            .unwrap_or_else(|_| panic!("{}", TensorError::InconsistentShape));
        Self::from_array(data)
    }

    /// 截取[start, end)范围内的行（首个维度），其余维度不变
    pub fn slice_rows(&self, start: usize, end: usize) -> Self {
        assert!(
            start <= end && end <= self.rows(),
            "{}",
            TensorError::IncompatibleShape
        );
        Self::from_array(
            self.data
                .slice_axis(Axis(0), Slice::from(start..end))
                .to_owned(),
        )
    }

    /// 取出第`index`行，结果比原张量少一个维度
    pub fn index_row(&self, index: usize) -> Self {
        assert!(index < self.rows(), "{}", TensorError::IncompatibleShape);
        Self::from_array(self.data.index_axis(Axis(0), index).to_owned())
    }

    /// 按`indices`逐个取行并拼成新张量（即gather），允许重复索引
    pub fn gather_rows(&self, indices: &[usize]) -> Self {
        assert!(
            indices.iter().all(|&i| i < self.rows()),
            "{}",
            TensorError::IncompatibleShape
        );
        if indices.is_empty() {
            let mut shape = self.shape().to_vec();
            shape[0] = 0;
            return Self::zeros(&shape);
        }
        Self::from_array(self.data.select(Axis(0), indices))
    }
}
