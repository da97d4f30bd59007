/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 张量的除法。只支持张量作被除数：
 *                 1. 除数为纯数：逐元素相除；
 *                 2. 除数为张量：支持 NumPy 风格的广播（broadcasting）。
 *                 除数为零时按IEEE语义得到inf/NaN，不做检查。
 */

use crate::errors::TensorError;
use crate::tensor::Tensor;
use std::ops::Div;

impl Div<f32> for Tensor {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self::from_array(&self.data / scalar)
    }
}
impl Div<f32> for &Tensor {
    type Output = Tensor;

    fn div(self, scalar: f32) -> Tensor {
        Tensor::from_array(&self.data / scalar)
    }
}

impl Div for Tensor {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        div_within_tensors(&self, &other)
    }
}

impl<'b> Div<&'b Tensor> for &Tensor {
    type Output = Tensor;

    fn div(self, other: &'b Tensor) -> Tensor {
        div_within_tensors(self, other)
    }
}

fn div_within_tensors(tensor_1: &Tensor, tensor_2: &Tensor) -> Tensor {
    assert!(
        tensor_1.can_broadcast_with(tensor_2),
        "{}",
        TensorError::IncompatibleShape
    );
    Tensor::from_array(&tensor_1.data / &tensor_2.data)
}
