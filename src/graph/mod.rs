/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : 图批次（graph batch）的数据模型
 *
 * 同一批图有两种等价的表示：
 * - Ragged：`Vec<Graph>`，每个图各自持有节点/边/图级属性，边索引为图内局部索引；
 * - Flat：所有节点按图顺序拼接，配以所属图索引`graph_indicator`（每个节点一项、单调不减、
 *   恰好覆盖[0, num_graphs)），边索引为全局索引，图级属性沿新的首维堆叠。
 *
 * 两者之间只通过`flatten`/`restore`显式转换。属性张量以`Arc`持有：派生出新批次时，
 * 未改动的属性与原批次共享，不做深拷贝。
 */

mod flatten;


use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::SaliencyError;
use crate::tensor::{Tensor, segment_counts};

/// 按名称索引的属性表
pub type Attributes = BTreeMap<String, Arc<Tensor>>;

/// 节点特征（模型输入，以及嵌入后的连续表示）
pub const NODE_FEATURE: &str = "feature";
/// 图级标签，用于选择求导目标
pub const LABEL: &str = "label";
/// 归因结果写回的节点属性名
pub const SALIENCY: &str = "saliency";

/// 单个图（如一个分子）。边索引为图内局部索引
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    num_nodes: usize,
    source: Arc<[usize]>,
    target: Arc<[usize]>,
    node: Attributes,
    edge: Attributes,
    context: Attributes,
}

impl Graph {
    /// 以节点特征创建一个无边的图。节点数取自`node_feature`的行数，不允许为0
    pub fn new(node_feature: Tensor) -> Result<Self, SaliencyError> {
        if node_feature.dimension() == 0 || node_feature.rows() == 0 {
            return Err(SaliencyError::malformed("图中至少需要一个节点"));
        }
        let mut node = Attributes::new();
        let num_nodes = node_feature.rows();
        node.insert(NODE_FEATURE.to_string(), Arc::new(node_feature));
        Ok(Self {
            num_nodes,
            source: Arc::from(Vec::new()),
            target: Arc::from(Vec::new()),
            node,
            edge: Attributes::new(),
            context: Attributes::new(),
        })
    }

    /// 设置有向边（`source[i]` -> `target[i]`）。已有的边属性须与新边数一致
    pub fn with_edges(mut self, source: Vec<usize>, target: Vec<usize>) -> Result<Self, SaliencyError> {
        if source.len() != target.len() {
            return Err(SaliencyError::malformed(format!(
                "边的起点数{}与终点数{}不一致",
                source.len(),
                target.len()
            )));
        }
        if let Some(&bad) = source.iter().chain(&target).find(|&&i| i >= self.num_nodes) {
            return Err(SaliencyError::malformed(format!(
                "边索引{bad}超出节点范围[0, {})",
                self.num_nodes
            )));
        }
        if let Some((name, _)) = self.edge.iter().find(|(_, t)| t.rows() != source.len()) {
            return Err(SaliencyError::malformed(format!(
                "边属性`{name}`的行数与新的边数{}不一致",
                source.len()
            )));
        }
        self.source = Arc::from(source);
        self.target = Arc::from(target);
        Ok(self)
    }

    pub fn with_node_attribute(mut self, name: &str, value: Tensor) -> Result<Self, SaliencyError> {
        check_rows(&value, self.num_nodes, "节点", name)?;
        self.node.insert(name.to_string(), Arc::new(value));
        Ok(self)
    }

    pub fn with_edge_attribute(mut self, name: &str, value: Tensor) -> Result<Self, SaliencyError> {
        check_rows(&value, self.num_edges(), "边", name)?;
        self.edge.insert(name.to_string(), Arc::new(value));
        Ok(self)
    }

    /// 图级属性（如`label`），形状任意
    pub fn with_context(mut self, name: &str, value: Tensor) -> Self {
        self.context.insert(name.to_string(), Arc::new(value));
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.source.len()
    }

    pub fn source(&self) -> &[usize] {
        &self.source
    }

    pub fn target(&self) -> &[usize] {
        &self.target
    }

    pub fn node(&self, name: &str) -> Option<&Tensor> {
        self.node.get(name).map(Arc::as_ref)
    }

    pub fn edge(&self, name: &str) -> Option<&Tensor> {
        self.edge.get(name).map(Arc::as_ref)
    }

    pub fn context(&self, name: &str) -> Option<&Tensor> {
        self.context.get(name).map(Arc::as_ref)
    }

    pub fn node_attributes(&self) -> &Attributes {
        &self.node
    }

    pub fn edge_attributes(&self) -> &Attributes {
        &self.edge
    }

    pub fn context_attributes(&self) -> &Attributes {
        &self.context
    }
}

/// 扁平化后的图批次
#[derive(Debug, Clone, PartialEq)]
pub struct FlatBatch {
    graph_indicator: Arc<[usize]>,
    num_graphs: usize,
    edges_per_graph: Arc<[usize]>,
    source: Arc<[usize]>,
    target: Arc<[usize]>,
    node: Attributes,
    edge: Attributes,
    context: Attributes,
}

impl FlatBatch {
    /// 由所属图索引和拼接后的节点特征创建（暂无边）
    pub fn new(graph_indicator: Vec<usize>, node_feature: Tensor) -> Result<Self, SaliencyError> {
        let num_graphs = validate_graph_indicator(&graph_indicator)?;
        check_rows(&node_feature, graph_indicator.len(), "节点", NODE_FEATURE)?;
        let mut node = Attributes::new();
        node.insert(NODE_FEATURE.to_string(), Arc::new(node_feature));
        Ok(Self {
            graph_indicator: Arc::from(graph_indicator),
            num_graphs,
            edges_per_graph: Arc::from(vec![0; num_graphs]),
            source: Arc::from(Vec::new()),
            target: Arc::from(Vec::new()),
            node,
            edge: Attributes::new(),
            context: Attributes::new(),
        })
    }

    /// 设置全局索引的有向边。边须按所属图分组排列，且不能跨图
    pub fn with_edges(mut self, source: Vec<usize>, target: Vec<usize>) -> Result<Self, SaliencyError> {
        if source.len() != target.len() {
            return Err(SaliencyError::malformed(format!(
                "边的起点数{}与终点数{}不一致",
                source.len(),
                target.len()
            )));
        }
        let num_nodes = self.num_nodes();
        if let Some(&bad) = source.iter().chain(&target).find(|&&i| i >= num_nodes) {
            return Err(SaliencyError::malformed(format!(
                "边索引{bad}超出节点范围[0, {num_nodes})"
            )));
        }
        let edge_graph = source
            .iter()
            .zip(&target)
            .map(|(&s, &t)| {
                let graph = self.graph_indicator[s];
                if graph == self.graph_indicator[t] {
                    Ok(graph)
                } else {
                    Err(SaliencyError::malformed(format!("边{s}->{t}跨越了不同的图")))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if edge_graph.windows(2).any(|w| w[0] > w[1]) {
            return Err(SaliencyError::malformed("边须按所属图的顺序排列"));
        }
        if let Some((name, _)) = self.edge.iter().find(|(_, t)| t.rows() != source.len()) {
            return Err(SaliencyError::malformed(format!(
                "边属性`{name}`的行数与新的边数{}不一致",
                source.len()
            )));
        }
        self.edges_per_graph = Arc::from(segment_counts(&edge_graph, self.num_graphs));
        self.source = Arc::from(source);
        self.target = Arc::from(target);
        Ok(self)
    }

    /// 添加或替换一个节点属性，其余属性与原批次共享
    pub fn with_node_attribute(mut self, name: &str, value: Tensor) -> Result<Self, SaliencyError> {
        check_rows(&value, self.num_nodes(), "节点", name)?;
        self.node.insert(name.to_string(), Arc::new(value));
        Ok(self)
    }

    pub fn with_edge_attribute(mut self, name: &str, value: Tensor) -> Result<Self, SaliencyError> {
        check_rows(&value, self.num_edges(), "边", name)?;
        self.edge.insert(name.to_string(), Arc::new(value));
        Ok(self)
    }

    /// 添加或替换一个图级属性，首维须等于图的数量
    pub fn with_context(mut self, name: &str, value: Tensor) -> Result<Self, SaliencyError> {
        check_rows(&value, self.num_graphs, "图", name)?;
        self.context.insert(name.to_string(), Arc::new(value));
        Ok(self)
    }

    pub fn num_graphs(&self) -> usize {
        self.num_graphs
    }

    pub fn num_nodes(&self) -> usize {
        self.graph_indicator.len()
    }

    pub fn num_edges(&self) -> usize {
        self.source.len()
    }

    /// 每个节点所属图的索引
    pub fn graph_indicator(&self) -> &[usize] {
        &self.graph_indicator
    }

    pub fn nodes_per_graph(&self) -> Vec<usize> {
        segment_counts(&self.graph_indicator, self.num_graphs)
    }

    pub fn edges_per_graph(&self) -> &[usize] {
        &self.edges_per_graph
    }

    pub fn source(&self) -> &[usize] {
        &self.source
    }

    pub fn target(&self) -> &[usize] {
        &self.target
    }

    pub fn node(&self, name: &str) -> Option<&Tensor> {
        self.node.get(name).map(Arc::as_ref)
    }

    pub fn edge(&self, name: &str) -> Option<&Tensor> {
        self.edge.get(name).map(Arc::as_ref)
    }

    pub fn context(&self, name: &str) -> Option<&Tensor> {
        self.context.get(name).map(Arc::as_ref)
    }

    /// 节点特征，缺失时视为批次不合法
    pub fn node_feature(&self) -> Result<&Tensor, SaliencyError> {
        self.node(NODE_FEATURE).ok_or_else(|| {
            SaliencyError::malformed(format!("批次缺少节点属性`{NODE_FEATURE}`"))
        })
    }

    /// 以`feature`替换节点特征（用于积分路径上的插值等）
    pub fn with_node_feature(self, feature: Tensor) -> Result<Self, SaliencyError> {
        self.with_node_attribute(NODE_FEATURE, feature)
    }
}

/// 图批次：两种表示的带标签联合体
#[derive(Debug, Clone, PartialEq)]
pub enum GraphBatch {
    Ragged(Vec<Graph>),
    Flat(FlatBatch),
}

impl From<Vec<Graph>> for GraphBatch {
    fn from(graphs: Vec<Graph>) -> Self {
        Self::Ragged(graphs)
    }
}

impl From<FlatBatch> for GraphBatch {
    fn from(flat: FlatBatch) -> Self {
        Self::Flat(flat)
    }
}

impl GraphBatch {
    pub fn is_ragged(&self) -> bool {
        matches!(self, Self::Ragged(_))
    }

    pub fn num_graphs(&self) -> usize {
        match self {
            Self::Ragged(graphs) => graphs.len(),
            Self::Flat(flat) => flat.num_graphs(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        match self {
            Self::Ragged(graphs) => graphs.iter().map(Graph::num_nodes).sum(),
            Self::Flat(flat) => flat.num_nodes(),
        }
    }

    /// 转为扁平表示。已是扁平表示时返回其（共享属性的）副本
    pub fn flatten(&self) -> Result<FlatBatch, SaliencyError> {
        match self {
            Self::Ragged(graphs) => FlatBatch::from_graphs(graphs),
            Self::Flat(flat) => Ok(flat.clone()),
        }
    }

    /// 把扁平批次还原为与`self`相同的表示
    pub fn restore(&self, flat: FlatBatch) -> Result<GraphBatch, SaliencyError> {
        if flat.num_graphs() != self.num_graphs() || flat.num_nodes() != self.num_nodes() {
            return Err(SaliencyError::malformed(format!(
                "无法还原：原批次为{}个图/{}个节点，扁平批次为{}个图/{}个节点",
                self.num_graphs(),
                self.num_nodes(),
                flat.num_graphs(),
                flat.num_nodes()
            )));
        }
        Ok(match self {
            Self::Ragged(_) => Self::Ragged(flat.to_graphs()),
            Self::Flat(_) => Self::Flat(flat),
        })
    }

    /// 返回添加（或替换）了节点属性`name`的新批次，表示形式保持不变。
    /// `values`按扁平节点顺序排列，首维为整批的节点总数
    pub fn with_node_attribute(&self, name: &str, values: Tensor) -> Result<GraphBatch, SaliencyError> {
        match self {
            Self::Flat(flat) => Ok(Self::Flat(flat.clone().with_node_attribute(name, values)?)),
            Self::Ragged(graphs) => {
                check_rows(&values, self.num_nodes(), "节点", name)?;
                let mut offset = 0;
                let graphs = graphs
                    .iter()
                    .map(|graph| {
                        let end = offset + graph.num_nodes();
                        let rows = values.slice_rows(offset, end);
                        offset = end;
                        graph.clone().with_node_attribute(name, rows)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Ragged(graphs))
            }
        }
    }

    pub fn graphs(&self) -> Option<&[Graph]> {
        match self {
            Self::Ragged(graphs) => Some(graphs),
            Self::Flat(_) => None,
        }
    }

    pub fn as_flat(&self) -> Option<&FlatBatch> {
        match self {
            Self::Flat(flat) => Some(flat),
            Self::Ragged(_) => None,
        }
    }
}

/// 校验所属图索引，返回图的数量。
/// 要求：非空、从0开始、相邻两项之差为0或1（即单调不减且不跳号，因此不存在空图）
fn validate_graph_indicator(graph_indicator: &[usize]) -> Result<usize, SaliencyError> {
    let (&first, &last) = match (graph_indicator.first(), graph_indicator.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SaliencyError::malformed("批次中至少需要一个节点")),
    };
    if first != 0 {
        return Err(SaliencyError::malformed(format!(
            "所属图索引须从0开始，实际为{first}"
        )));
    }
    if let Some(i) = graph_indicator
        .windows(2)
        .position(|w| w[1] < w[0] || w[1] > w[0] + 1)
    {
        return Err(SaliencyError::malformed(format!(
            "所属图索引须单调不减且不跳号：第{}项为{}，第{}项为{}",
            i,
            graph_indicator[i],
            i + 1,
            graph_indicator[i + 1]
        )));
    }
    Ok(last + 1)
}

fn check_rows(value: &Tensor, expected: usize, kind: &str, name: &str) -> Result<(), SaliencyError> {
    if value.dimension() == 0 || value.rows() != expected {
        return Err(SaliencyError::malformed(format!(
            "{kind}属性`{name}`的首维应为{expected}，实际形状为{:?}",
            value.shape()
        )));
    }
    Ok(())
}
