//! # Graph Saliency
//!
//! `graph_saliency`用纯rust为图神经网络（如分子性质预测模型）计算逐节点、逐特征的归因，
//! 回答“模型的预测主要由哪些原子及其哪些特征决定”。
//!
//! 模型在第一个图卷积层处被切分为嵌入部分与打分部分，归因针对切分点处的连续节点表示计算，
//! 离散的原子类型编号本身不参与求导。支持三种算法：
//! - 原始梯度（vanilla gradient）；
//! - 积分梯度（integrated gradients）；
//! - 多层Grad-CAM。
//!
//! 结果作为节点属性`saliency`挂回输入批次，批次可以是逐图的（ragged）或扁平拼接的（flat）。
//!

pub mod errors;
pub mod graph;
pub mod nn;
pub mod saliency;
pub mod tensor;
pub mod utils;

pub use errors::SaliencyError;
pub use graph::{FlatBatch, Graph, GraphBatch};
pub use nn::{Layer, Model};
pub use saliency::{MethodKind, ReduceMode, Saliency, SaliencyConfig};
