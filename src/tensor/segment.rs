/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 分段归约（segment reduction）：按`segment_ids`把各行分组，对每组独立求和/求均值。
 *                 与`gather_rows`配合，即可把每组的结果再广播回组内每一行。
 *                 `segment_ids`不要求有序，但每个值都须在[0, num_segments)内。
 */

use super::Tensor;
use crate::errors::SaliencyError;
use ndarray::{Array, Axis, IxDyn};

impl Tensor {
    /// 按`segment_ids`分组求和，结果形状为`[num_segments, ...]`，无成员的组为0
    pub fn segment_sum(
        &self,
        segment_ids: &[usize],
        num_segments: usize,
    ) -> Result<Self, SaliencyError> {
        self.check_segment_ids(segment_ids, num_segments)?;

        let mut shape = self.shape().to_vec();
        shape[0] = num_segments;
        let mut out = Array::<f32, IxDyn>::zeros(IxDyn(&shape));
        for (row, &segment) in segment_ids.iter().enumerate() {
            let mut dst = out.index_axis_mut(Axis(0), segment);
            dst += &self.data.index_axis(Axis(0), row);
        }
        Ok(Self::from_array(out))
    }

    /// 按`segment_ids`分组求均值，无成员的组为0
    pub fn segment_mean(
        &self,
        segment_ids: &[usize],
        num_segments: usize,
    ) -> Result<Self, SaliencyError> {
        let mut out = self.segment_sum(segment_ids, num_segments)?;
        for (segment, count) in segment_counts(segment_ids, num_segments)
            .into_iter()
            .enumerate()
        {
            if count > 0 {
                let mut dst = out.data.index_axis_mut(Axis(0), segment);
                dst /= count as f32;
            }
        }
        Ok(out)
    }

    fn check_segment_ids(
        &self,
        segment_ids: &[usize],
        num_segments: usize,
    ) -> Result<(), SaliencyError> {
        if self.dimension() == 0 || self.rows() != segment_ids.len() {
            return Err(SaliencyError::shape_mismatch(
                &[segment_ids.len()],
                self.shape(),
                "分段归约的行数须与segment_ids的长度一致",
            ));
        }
        if let Some(&bad) = segment_ids.iter().find(|&&id| id >= num_segments) {
            return Err(SaliencyError::malformed(format!(
                "segment id {bad}超出范围[0, {num_segments})"
            )));
        }
        Ok(())
    }
}

/// 统计每个组的成员数
pub fn segment_counts(segment_ids: &[usize], num_segments: usize) -> Vec<usize> {
    let mut counts = vec![0; num_segments];
    for &id in segment_ids {
        if let Some(count) = counts.get_mut(id) {
            *count += 1;
        }
    }
    counts
}
