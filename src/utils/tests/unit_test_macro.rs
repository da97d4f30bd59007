use crate::errors::SaliencyError;
use crate::{assert_err, assert_panic};

#[test]
fn test_assert_panic_macro() {
    assert_panic!(panic!("test panic"));
    assert_panic!(panic!("custom test panic msg"), "custom test panic msg");
}

#[test]
fn test_assert_err_macro() {
    let result: Result<(), SaliencyError> =
        Err(SaliencyError::Configuration("积分步数`steps`须为正整数".to_string()));
    assert_err!(result);
    assert_err!(result, SaliencyError::Configuration("积分步数`steps`须为正整数"));
    assert_err!(result, SaliencyError::Configuration(msg) if msg.contains("steps"));

    let result: Result<(), SaliencyError> =
        Err(SaliencyError::shape_mismatch(&[2, 2], &[3, 2], "消息"));
    assert_err!(result, SaliencyError::ShapeMismatch([2, 2], [3, 2], "消息"));
    assert_err!(result, SaliencyError::ShapeMismatch { expected, .. } if expected == &[2, 2]);
}
