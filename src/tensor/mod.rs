/*
 * @Author       : 老董
 * @Date         : 2026-02-03
 * @Description  : 基于ndarray的稠密f32张量。只提供归因计算所需的运算：
 *                 逐元素四则运算（支持广播）、矩阵乘法、按轴归约、拼接/堆叠、按行索引，
 *                 以及按所属图索引的分段归约（见`segment.rs`）。
 */

use ndarray::{Array, IxDyn};
use rand::SeedableRng;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;

use crate::errors::TensorError;

mod ops {
    pub mod add;
    pub mod div;
    pub mod mul;
    pub mod others;
    pub mod sub;
}

mod filter;
mod property;
mod segment;
mod shape;

pub use segment::segment_counts;


/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通过Tensor初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（类型为usize、f32等）就只是纯数（number），在这里不被认为是张量。
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量。若为标量，`shape`可以是[]、[1]、[1,1]...；
    /// 若为向量，`shape`可以是[n]、[1,n]、[n,1]；若为矩阵，`shape`可以是[n,m]。
    /// 注：`data`的长度必须和`shape`中所有元素的乘积相等，否则panic。
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        let expected: usize = shape.iter().product();
        assert!(
            data.len() == expected,
            "{}",
            TensorError::DataShapeMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        );
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec())
            .unwrap_or_else(|e| panic!("{e}"));
        Self { data }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 创建一个所有元素均为`value`的张量
    pub fn full(value: f32, shape: &[usize]) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// 与`self`同形状的全零张量
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape())
    }

    /// 创建一个随机张量，其值在[min, max]的闭区间。使用固定种子，便于复现
    pub fn new_random_seeded(min: f32, max: f32, shape: &[usize], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::random_with(&mut rng, min, max, shape)
    }

    pub(crate) fn from_array(data: Array<f32, IxDyn>) -> Self {
        Self { data }
    }
}

// 私有方法
impl Tensor {
    fn random_with<R: rand::Rng>(rng: &mut R, min: f32, max: f32, shape: &[usize]) -> Self {
        let uniform = Uniform::from(min..=max);
        let data = (0..shape.iter().product::<usize>())
            .map(|_| uniform.sample(rng))
            .collect::<Vec<_>>();
        Self::new(&data, shape)
    }

    /// NumPy风格的广播兼容性检查：从右向左对齐，每个维度相等或其中一个为1
    pub(crate) fn can_broadcast_with(&self, other: &Self) -> bool {
        self.shape()
            .iter()
            .rev()
            .zip(other.shape().iter().rev())
            .all(|(&a, &b)| a == b || a == 1 || b == 1)
    }
}
