/*
 * @Author       : 老董
 * @Date         : 2026-02-10
 * @Description  : 积分梯度归因的集成测试
 *
 * 单步时与原始梯度的关系（左端点/中点两种取点规则）、步数足够多时的近似完备性，
 * 以及非零基线与配置错误
 */

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use graph_saliency::assert_err;
use graph_saliency::errors::SaliencyError;
use graph_saliency::graph::{Graph, GraphBatch, LABEL, NODE_FEATURE};
use graph_saliency::nn::{Activation, GraphConv, Linear, Model, Pooling, Readout};
use graph_saliency::saliency::{Baseline, MethodKind, PathRule, ReduceMode, Saliency, SaliencyConfig};
use graph_saliency::tensor::Tensor;

/// 模型从图卷积开始，因此嵌入部分为空，节点特征即归因对象
fn smooth_model() -> Model {
    let conv = GraphConv::from_weights(
        "conv",
        Tensor::full(0.3, &[2, 2]),
        Tensor::full(0.3, &[2, 2]),
        None,
        Activation::Tanh,
    )
    .unwrap();
    Model::new(vec![
        Arc::new(conv),
        Arc::new(Readout::new("readout", Pooling::Sum)),
        Arc::new(
            Linear::from_weights(
                "head",
                Tensor::new(&[1., 0.5], &[2, 1]),
                None,
                Activation::Identity,
            )
            .unwrap(),
        ),
    ])
}

fn batch_with_features(feature: Tensor) -> GraphBatch {
    let graph = Graph::new(feature)
        .unwrap()
        .with_edges(vec![0, 1, 1, 2, 2, 3], vec![1, 0, 2, 1, 3, 2])
        .unwrap();
    GraphBatch::from(vec![graph])
}

fn feature() -> Tensor {
    Tensor::new_random_seeded(0.5, 1.5, &[4, 2], 17)
}

fn integrated(steps: usize, path_rule: PathRule) -> Saliency {
    Saliency::build(
        &smooth_model(),
        SaliencyConfig::new(MethodKind::Integrated)
            .with_reduce_mode(ReduceMode::None)
            .with_steps(steps)
            .with_path_rule(path_rule),
    )
    .unwrap()
}

fn assert_close(a: &Tensor, b: &Tensor) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.to_vec().iter().zip(b.to_vec()) {
        assert_abs_diff_eq!(*x, y, epsilon = 1e-5);
    }
}

#[test]
fn test_single_midpoint_step_is_gradient_at_half_times_feature() {
    let f = feature();
    let vanilla = Saliency::vanilla(&smooth_model(), ReduceMode::None).unwrap();
    let grad_at_half = vanilla
        .raw_saliency(&batch_with_features(0.5 * &f))
        .unwrap();

    let raw = integrated(1, PathRule::Midpoint)
        .raw_saliency(&batch_with_features(f.clone()))
        .unwrap();
    assert_close(&raw, &(grad_at_half * &f));
}

#[test]
fn test_single_left_step_is_gradient_at_baseline_times_feature() {
    let f = feature();
    let vanilla = Saliency::vanilla(&smooth_model(), ReduceMode::None).unwrap();
    let grad_at_zero = vanilla
        .raw_saliency(&batch_with_features(f.zeros_like()))
        .unwrap();

    let raw = integrated(1, PathRule::Left)
        .raw_saliency(&batch_with_features(f.clone()))
        .unwrap();
    assert_close(&raw, &(grad_at_zero * &f));
}

#[test]
fn test_completeness_with_many_steps() {
    let model = smooth_model();
    let f = feature();
    let batch = batch_with_features(f.clone());
    let at_feature = model.predict(&batch).unwrap().sum_all();
    let at_baseline = model
        .predict(&batch_with_features(f.zeros_like()))
        .unwrap()
        .sum_all();
    let expected = at_feature - at_baseline;

    for rule in [PathRule::Left, PathRule::Midpoint] {
        let total = integrated(500, rule).raw_saliency(&batch).unwrap().sum_all();
        assert!(
            (total - expected).abs() <= 1e-2 * expected.abs(),
            "{rule:?}: 归因之和{total}与目标差{expected}相差过大"
        );
    }
}

#[test]
fn test_constant_baseline() {
    let f = feature();
    let batch = batch_with_features(f.clone());
    let saliency = Saliency::build(
        &smooth_model(),
        SaliencyConfig::new(MethodKind::Integrated)
            .with_reduce_mode(ReduceMode::None)
            .with_steps(1)
            .with_baseline(Baseline::Constant(0.5)),
    )
    .unwrap();
    // 单步左端点：grad(B) × (F - B)
    let vanilla = Saliency::vanilla(&smooth_model(), ReduceMode::None).unwrap();
    let grad_at_baseline = vanilla
        .raw_saliency(&batch_with_features(Tensor::full(0.5, &[4, 2])))
        .unwrap();
    assert_close(
        &saliency.raw_saliency(&batch).unwrap(),
        &(grad_at_baseline * (&f - 0.5)),
    );

    // 特征等于基线时归因全为0
    let at_baseline = batch_with_features(Tensor::full(0.5, &[4, 2]));
    assert_eq!(
        saliency.raw_saliency(&at_baseline).unwrap(),
        Tensor::zeros(&[4, 2])
    );
}

#[test]
fn test_every_step_uses_label_of_original_batch() {
    // 两个输出的头，标签只选第0个输出
    let conv = GraphConv::new("conv", 2, 2, Activation::Tanh, 1);
    let head = Linear::new("head", 2, 2, Activation::Identity, 2);
    let model = Model::new(vec![
        Arc::new(conv),
        Arc::new(Readout::new("readout", Pooling::Mean)),
        Arc::new(head),
    ]);
    let graph = Graph::new(feature())
        .unwrap()
        .with_context(LABEL, Tensor::new(&[1., 0.], &[2]));
    let batch = GraphBatch::from(vec![graph]);

    let saliency = Saliency::build(
        &model,
        SaliencyConfig::new(MethodKind::Integrated)
            .with_reduce_mode(ReduceMode::None)
            .with_steps(400)
            .with_path_rule(PathRule::Midpoint),
    )
    .unwrap();
    let total = saliency.raw_saliency(&batch).unwrap().sum_all();

    let f = batch.graphs().unwrap()[0].node(NODE_FEATURE).unwrap().clone();
    let at_feature = model.predict(&batch).unwrap().to_vec()[0];
    let at_zero = model
        .predict(&GraphBatch::from(vec![Graph::new(f.zeros_like()).unwrap()]))
        .unwrap()
        .to_vec()[0];
    assert_abs_diff_eq!(total, at_feature - at_zero, epsilon = 1e-3);
}

#[test]
fn test_zero_steps_is_rejected() {
    assert_err!(
        Saliency::integrated(&smooth_model(), ReduceMode::Mean, 0),
        SaliencyError::Configuration("积分步数`steps`须为正整数")
    );
    let saliency = Saliency::integrated(&smooth_model(), ReduceMode::Sum, 8).unwrap();
    assert_eq!(saliency.config().steps, 8);
    assert_eq!(saliency.config().method, MethodKind::Integrated);
    let result = saliency.attribute(&batch_with_features(feature())).unwrap();
    assert_eq!(result.num_nodes(), 4);
}
