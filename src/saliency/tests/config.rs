use crate::assert_err;
use crate::errors::SaliencyError;
use crate::saliency::{Baseline, DEFAULT_STEPS, MethodKind, PathRule, ReduceMode, SaliencyConfig};
use crate::tensor::Tensor;

#[test]
fn test_default_config() {
    let config = SaliencyConfig::default();
    assert_eq!(config.method, MethodKind::Vanilla);
    assert_eq!(config.reduce_mode, ReduceMode::Mean);
    assert_eq!(config.steps, DEFAULT_STEPS);
    assert_eq!(config.baseline, Baseline::Zeros);
    assert_eq!(config.path_rule, PathRule::Left);
    assert!(config.validate().is_ok());
}

#[test]
fn test_reduce_mode_parsing() {
    let parse = |s: &str| s.parse::<ReduceMode>().unwrap();
    assert_eq!(parse(""), ReduceMode::None);
    assert_eq!(parse("none"), ReduceMode::None);
    assert_eq!(parse("None"), ReduceMode::None);
    assert_eq!(parse("sum"), ReduceMode::Sum);
    assert_eq!(parse("summation"), ReduceMode::Sum);
    assert_eq!(parse("mean"), ReduceMode::Mean);
    // 不认识的一律取均值
    assert_eq!(parse("average"), ReduceMode::Mean);
    assert_eq!(ReduceMode::Sum.to_string(), "sum");
}

#[test]
fn test_reduce_mode_reduces_last_axis() {
    let saliency = Tensor::new(&[1., 3., 2., 6.], &[2, 2]);
    assert_eq!(ReduceMode::None.reduce(saliency.clone()), saliency);
    assert_eq!(
        ReduceMode::Sum.reduce(saliency.clone()),
        Tensor::new(&[4., 8.], &[2])
    );
    assert_eq!(ReduceMode::Mean.reduce(saliency), Tensor::new(&[2., 4.], &[2]));
}

#[test]
fn test_path_rule_fraction() {
    assert_eq!(PathRule::Left.fraction(0, 4), 0.);
    assert_eq!(PathRule::Left.fraction(3, 4), 0.75);
    assert_eq!(PathRule::Midpoint.fraction(0, 1), 0.5);
    assert_eq!(PathRule::Midpoint.fraction(3, 4), 0.875);
}

#[test]
fn test_baseline_tensor() {
    let feature = Tensor::new(&[1., 2.], &[1, 2]);
    assert_eq!(Baseline::Zeros.tensor_like(&feature), Tensor::zeros(&[1, 2]));
    assert_eq!(
        Baseline::Constant(0.5).tensor_like(&feature),
        Tensor::full(0.5, &[1, 2])
    );
}

#[test]
fn test_config_json_round_trip() {
    let config = SaliencyConfig::new(MethodKind::Integrated)
        .with_reduce_mode(ReduceMode::Sum)
        .with_steps(20)
        .with_baseline(Baseline::Constant(-1.))
        .with_path_rule(PathRule::Midpoint);
    let json = config.to_json().unwrap();
    assert!(json.contains("\"integrated\""));
    assert_eq!(SaliencyConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_config_json_defaults() {
    let config = SaliencyConfig::from_json(r#"{"method": "grad_cam"}"#).unwrap();
    assert_eq!(config, SaliencyConfig::new(MethodKind::GradCam));

    let config = SaliencyConfig::from_json(r#"{"reduce_mode": "none"}"#).unwrap();
    assert_eq!(config.reduce_mode, ReduceMode::None);
    assert_eq!(config.method, MethodKind::Vanilla);
}

#[test]
fn test_invalid_config() {
    assert_err!(
        SaliencyConfig::default().with_steps(0).validate(),
        SaliencyError::Configuration("积分步数`steps`须为正整数")
    );
    assert_err!(
        SaliencyConfig::from_json(r#"{"method": "integrated", "steps": 0}"#),
        SaliencyError::Configuration("积分步数`steps`须为正整数")
    );
    assert_err!(
        SaliencyConfig::from_json(r#"{"method": "occlusion"}"#),
        SaliencyError::Configuration(msg) if msg.starts_with("无法解析配置")
    );
}
