/*
 * @Author       : 老董
 * @Date         : 2026-02-05
 * @Description  : Ragged <-> Flat 的显式互转。两个方向都保持图、节点、边的原有顺序，
 *                 因此 ragged -> flat -> ragged 是无损的。
 */

use std::sync::Arc;

use super::{Attributes, FlatBatch, Graph};
use crate::errors::SaliencyError;
use crate::tensor::Tensor;

impl FlatBatch {
    /// 把一组图拼接为扁平批次。
    /// 所有图须具有相同名称集合的节点/边/图级属性，且同名属性除首维外形状一致
    pub fn from_graphs(graphs: &[Graph]) -> Result<Self, SaliencyError> {
        let first = graphs
            .first()
            .ok_or_else(|| SaliencyError::malformed("批次中至少需要一个图"))?;

        let mut graph_indicator = Vec::with_capacity(graphs.iter().map(Graph::num_nodes).sum());
        let mut source = Vec::new();
        let mut target = Vec::new();
        let mut edges_per_graph = Vec::with_capacity(graphs.len());
        let mut offset = 0;
        for (index, graph) in graphs.iter().enumerate() {
            if graph.num_nodes() == 0 {
                return Err(SaliencyError::malformed(format!("第{index}个图没有节点")));
            }
            graph_indicator.extend(std::iter::repeat(index).take(graph.num_nodes()));
            source.extend(graph.source().iter().map(|s| s + offset));
            target.extend(graph.target().iter().map(|t| t + offset));
            edges_per_graph.push(graph.num_edges());
            offset += graph.num_nodes();
        }

        Ok(Self {
            graph_indicator: Arc::from(graph_indicator),
            num_graphs: graphs.len(),
            edges_per_graph: Arc::from(edges_per_graph),
            source: Arc::from(source),
            target: Arc::from(target),
            node: concat_attributes(graphs, &first.node, node_of, "节点")?,
            edge: concat_attributes(graphs, &first.edge, edge_of, "边")?,
            context: stack_attributes(graphs, &first.context)?,
        })
    }

    /// 按图拆分回ragged表示
    pub fn to_graphs(&self) -> Vec<Graph> {
        let nodes_per_graph = self.nodes_per_graph();
        let mut node_offset = 0;
        let mut edge_offset = 0;
        nodes_per_graph
            .iter()
            .zip(self.edges_per_graph.iter())
            .enumerate()
            .map(|(index, (&num_nodes, &num_edges))| {
                let node_end = node_offset + num_nodes;
                let edge_end = edge_offset + num_edges;
                let graph = Graph {
                    num_nodes,
                    source: self.source[edge_offset..edge_end]
                        .iter()
                        .map(|s| s - node_offset)
                        .collect(),
                    target: self.target[edge_offset..edge_end]
                        .iter()
                        .map(|t| t - node_offset)
                        .collect(),
                    node: slice_attributes(&self.node, node_offset, node_end),
                    edge: slice_attributes(&self.edge, edge_offset, edge_end),
                    context: self
                        .context
                        .iter()
                        .map(|(name, t)| (name.clone(), Arc::new(t.index_row(index))))
                        .collect(),
                };
                node_offset = node_end;
                edge_offset = edge_end;
                graph
            })
            .collect()
    }
}

type Selector = fn(&Graph) -> &Attributes;

fn node_of(graph: &Graph) -> &Attributes {
    &graph.node
}

fn edge_of(graph: &Graph) -> &Attributes {
    &graph.edge
}

fn context_of(graph: &Graph) -> &Attributes {
    &graph.context
}

fn concat_attributes(
    graphs: &[Graph],
    reference: &Attributes,
    select: Selector,
    kind: &str,
) -> Result<Attributes, SaliencyError> {
    check_same_names(graphs, reference, select, kind)?;
    reference
        .keys()
        .map(|name| {
            let parts = graphs
                .iter()
                .map(|g| select(g)[name].as_ref())
                .collect::<Vec<_>>();
            let trailing = &parts[0].shape()[1..];
            if let Some(bad) = parts.iter().find(|t| &t.shape()[1..] != trailing) {
                return Err(SaliencyError::malformed(format!(
                    "{kind}属性`{name}`在各图间的形状不一致：{:?}与{:?}",
                    parts[0].shape(),
                    bad.shape()
                )));
            }
            Ok((name.clone(), Arc::new(Tensor::concat(&parts, 0))))
        })
        .collect()
}

fn stack_attributes(graphs: &[Graph], reference: &Attributes) -> Result<Attributes, SaliencyError> {
    check_same_names(graphs, reference, context_of, "图级")?;
    reference
        .keys()
        .map(|name| {
            let parts = graphs
                .iter()
                .map(|g| g.context[name].as_ref())
                .collect::<Vec<_>>();
            if let Some(bad) = parts.iter().find(|t| !t.is_same_shape(parts[0])) {
                return Err(SaliencyError::malformed(format!(
                    "图级属性`{name}`在各图间的形状不一致：{:?}与{:?}",
                    parts[0].shape(),
                    bad.shape()
                )));
            }
            Ok((name.clone(), Arc::new(Tensor::stack(&parts))))
        })
        .collect()
}

fn check_same_names(
    graphs: &[Graph],
    reference: &Attributes,
    select: Selector,
    kind: &str,
) -> Result<(), SaliencyError> {
    for (index, graph) in graphs.iter().enumerate() {
        let attributes = select(graph);
        if attributes.len() != reference.len()
            || !attributes.keys().zip(reference.keys()).all(|(a, b)| a == b)
        {
            return Err(SaliencyError::malformed(format!(
                "第{index}个图的{kind}属性{:?}与第0个图的{:?}不一致",
                attributes.keys().collect::<Vec<_>>(),
                reference.keys().collect::<Vec<_>>()
            )));
        }
    }
    Ok(())
}

fn slice_attributes(attributes: &Attributes, start: usize, end: usize) -> Attributes {
    attributes
        .iter()
        .map(|(name, t)| (name.clone(), Arc::new(t.slice_rows(start, end))))
        .collect()
}
