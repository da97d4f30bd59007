use crate::assert_err;
use crate::errors::SaliencyError;
use crate::saliency::select_target;
use crate::tensor::Tensor;

#[test]
fn test_multi_valued_label_selects_nonzero_positions() {
    let prediction = Tensor::new(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6], &[2, 3]);
    let label = Tensor::new(&[0., 1., 0., 1., 0., 0.], &[2, 3]);

    let target = select_target(Some(&label), &prediction).unwrap();
    assert_eq!(target.values, Tensor::new(&[0.2, 0.4], &[2]));
    assert_eq!(target.cotangent, label);
    assert!((target.total() - 0.6).abs() < 1e-6);
}

#[test]
fn test_nonzero_label_values_select_not_weight() {
    // 只有“非零”与否参与选择，标签数值本身不作为权重
    let prediction = Tensor::new(&[1., 2.], &[2, 1]);
    let label = Tensor::new(&[-3., 0.], &[2, 1]);
    let target = select_target(Some(&label), &prediction).unwrap();
    assert_eq!(target.values, Tensor::new(&[1.], &[1]));
    assert_eq!(target.cotangent, Tensor::new(&[1., 0.], &[2, 1]));
}

#[test]
fn test_fallback_to_whole_prediction() {
    let prediction = Tensor::new(&[0.1, 0.2, 0.3, 0.4], &[2, 2]);
    let whole = Tensor::new(&[0.1, 0.2, 0.3, 0.4], &[4]);

    // 无标签
    let target = select_target(None, &prediction).unwrap();
    assert_eq!(target.values, whole);
    assert_eq!(target.cotangent, Tensor::ones(&[2, 2]));

    // 单值标签
    let label = Tensor::new(&[1., 0.], &[2]);
    assert_eq!(select_target(Some(&label), &prediction).unwrap().values, whole);

    // 多值标签全为零
    let label = Tensor::zeros(&[2, 2]);
    assert_eq!(select_target(Some(&label), &prediction).unwrap().values, whole);
}

#[test]
fn test_label_shape_mismatch() {
    let prediction = Tensor::new(&[0.1, 0.2], &[2, 1]);
    let label = Tensor::new(&[1., 0., 0., 1.], &[2, 2]);
    assert_err!(
        select_target(Some(&label), &prediction),
        SaliencyError::MalformedBatch(msg) if msg.contains("不一致")
    );
}
