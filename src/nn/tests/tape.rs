use super::two_graph_batch;
use crate::assert_err;
use crate::errors::SaliencyError;
use crate::nn::{Activation, GradientTape, GraphConv, Layer, Pooling, Readout, Value};
use crate::tensor::Tensor;

#[test]
fn test_gradient_to_several_sources_in_one_sweep() {
    let conv_0 = GraphConv::new("conv_0", 2, 3, Activation::Tanh, 1);
    let conv_1 = GraphConv::new("conv_1", 3, 2, Activation::Tanh, 2);
    let readout = Readout::new("readout", Pooling::Sum);
    let batch = two_graph_batch(2, 7);

    let mut tape = GradientTape::new();
    let x0 = tape.constant(Value::Graph(batch.clone()));
    tape.watch(x0);
    let x1 = tape.apply(&conv_0, x0).unwrap();
    tape.watch(x1);
    let x2 = tape.apply(&conv_1, x1).unwrap();
    let y = tape.apply(&readout, x2).unwrap();
    let seed = Tensor::ones(&[2, 2]);
    let grads = tape.gradient(y, &seed, &[x0, x1]).unwrap();

    // 与手动串联各层的VJP一致
    let v0 = Value::Graph(batch);
    let v1 = conv_0.forward(&v0).unwrap();
    let v2 = conv_1.forward(&v1).unwrap();
    let v3 = readout.forward(&v2).unwrap();
    let g2 = readout.backward(&v2, &v3, &seed).unwrap();
    let g1 = conv_1.backward(&v1, &v2, &g2).unwrap();
    let g0 = conv_0.backward(&v0, &v1, &g1).unwrap();
    assert_eq!(grads, vec![g0, g1]);
}

#[test]
fn test_source_not_on_path_gets_zero_gradient() {
    let readout = Readout::new("readout", Pooling::Mean);
    let mut tape = GradientTape::new();
    let x = tape.constant(Value::Graph(two_graph_batch(2, 1)));
    let unused = tape.constant(Value::Dense(Tensor::ones(&[3, 4])));
    tape.watch(x);
    tape.watch(unused);
    let y = tape.apply(&readout, x).unwrap();

    let grads = tape.gradient(y, &Tensor::ones(&[2, 2]), &[unused]).unwrap();
    assert_eq!(grads, vec![Tensor::zeros(&[3, 4])]);
}

#[test]
fn test_gradient_errors() {
    let readout = Readout::new("readout", Pooling::Mean);
    let mut tape = GradientTape::new();
    let x = tape.constant(Value::Graph(two_graph_batch(2, 1)));
    let y = tape.apply(&readout, x).unwrap();

    assert!(!tape.is_watched(x));
    assert_err!(
        tape.gradient(y, &Tensor::ones(&[2, 2]), &[x]),
        SaliencyError::Computation(_)
    );

    tape.watch(x);
    assert_err!(
        tape.gradient(y, &Tensor::ones(&[2]), &[x]),
        SaliencyError::ShapeMismatch([2, 2], [2], "求导种子的形状须与目标张量一致")
    );
}

#[test]
fn test_only_branch_reaching_target_contributes() {
    // 同一输入分别送入两个读出层，只有其中一支通向目标
    let mean = Readout::new("mean", Pooling::Mean);
    let sum = Readout::new("sum", Pooling::Sum);
    let batch = two_graph_batch(2, 3);

    let mut tape = GradientTape::new();
    let x = tape.constant(Value::Graph(batch.clone()));
    tape.watch(x);
    let y_mean = tape.apply(&mean, x).unwrap();
    let _y_sum = tape.apply(&sum, x).unwrap();
    let seed = Tensor::ones(&[2, 2]);
    let grads = tape.gradient(y_mean, &seed, &[x]).unwrap();

    let input = Value::Graph(batch);
    let output = mean.forward(&input).unwrap();
    let expected = mean.backward(&input, &output, &seed).unwrap();
    assert_eq!(grads, vec![expected]);
}
