use super::Tensor;

impl Tensor {
    /// 基于另一个张量的条件选择，逐元素地在两个候选值间取其一
    ///
    /// # 参数
    /// * `other` - 用于比较的张量，其形状必须与当前张量相同
    /// * `condition` - 条件函数，接收当前张量和比较张量的对应元素值并返回bool
    /// * `true_fn` - 当条件为true时的值，可以使用两个张量的对应元素值
    /// * `false_fn` - 当条件为false时的值，可以使用两个张量的对应元素值
    ///
    /// 注：与`np.where`一致，NaN不做特殊处理，直接交给`condition`判断
    ///
    /// # 示例
    /// ```
    /// use graph_saliency::tensor::Tensor;
    /// let t = Tensor::new(&[-1.0, 0.0, 1.0], &[3]);
    /// let y = Tensor::new(&[0.0, 0.0, 0.0], &[3]);
    ///
    /// // 类似 np.where(x >= y, x + y, x - y)
    /// let result = t.where_with_tensor(&y, |x, y| x >= y, |x, y| x + y, |x, y| x - y);
    /// assert_eq!(result.to_vec(), vec![-1.0, 0.0, 1.0]);
    /// ```
    pub fn where_with_tensor<F, T, U>(
        &self,
        other: &Self,
        condition: F,
        true_fn: T,
        false_fn: U,
    ) -> Self
    where
        F: Fn(f32, f32) -> bool,
        T: Fn(f32, f32) -> f32,
        U: Fn(f32, f32) -> f32,
    {
        assert!(
            self.is_same_shape(other),
            "两个张量的形状必须相同，当前张量形状为{:?}，比较张量形状为{:?}",
            self.shape(),
            other.shape()
        );

        let result = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&x, &y)| {
                if condition(x, y) {
                    true_fn(x, y)
                } else {
                    false_fn(x, y)
                }
            })
            .collect::<Vec<_>>();

        Self::new(&result, self.shape())
    }

    /// 非零元素处取1，其余取0，形状不变
    pub fn nonzero_mask(&self) -> Self {
        self.map(|x| if x != 0.0 { 1.0 } else { 0.0 })
    }

    /// 按行优先顺序返回所有非零元素的扁平下标
    pub fn nonzero_positions(&self) -> Vec<usize> {
        self.data
            .iter()
            .enumerate()
            .filter_map(|(i, &x)| (x != 0.0).then_some(i))
            .collect()
    }
}
