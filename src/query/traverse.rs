//! Adjacency lists and bounded neighbourhood expansion

use super::types::{AdjacencyList, Direction};
use crate::adapter::{EdgeStore, Materializer};
use crate::codec::EdgeWhitelist;
use crate::graph::{EdgeMap, Graph, NodeTemplate};
use crate::select::Selector;
use crate::storage::StorageResult;
use crate::view::View;
use std::collections::HashSet;
use tracing::debug;

/// Collaborators a traversal reads from
pub struct Traversal<'a> {
    pub edges: &'a EdgeStore,
    pub materializer: &'a Materializer,
    pub selector: &'a dyn Selector,
    /// Expression matching every document that may become a node
    pub all_potential_nodes: &'a str,
}

impl<'a> Traversal<'a> {
    /// Group edges by one endpoint
    ///
    /// Without an edge set, the outgoing edges of all potential nodes are
    /// used, restricted by the whitelist.
    pub fn adjacency_list(
        &self,
        direction: Direction,
        edges: Option<&EdgeMap>,
        whitelist: &EdgeWhitelist,
    ) -> StorageResult<AdjacencyList> {
        let computed;
        let edges = match edges {
            Some(edges) => edges,
            None => {
                let titles = self.selector.evaluate(self.all_potential_nodes, None)?;
                computed = self.edges.edges_for_set(&titles, whitelist)?;
                &computed
            }
        };

        let mut list = AdjacencyList::new();
        for edge in edges.values() {
            list.entry(direction.endpoint(edge).clone())
                .or_default()
                .push(edge.clone());
        }
        for group in list.values_mut() {
            group.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Ok(list)
    }
}

/// Query for the neighbourhood of a set of documents
#[derive(Debug, Clone)]
pub struct NeighbourhoodQuery {
    /// Titles of the seed documents
    pub seeds: Vec<String>,
    /// Maximum number of expansion rounds (0 counts as 1)
    pub steps: usize,
    /// Restricts which edges are travelled
    pub whitelist: EdgeWhitelist,
    /// Attributes applied to every discovered node
    pub overrides: Option<NodeTemplate>,
}

impl NeighbourhoodQuery {
    pub fn from<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seeds: seeds.into_iter().map(Into::into).collect(),
            steps: 1,
            whitelist: EdgeWhitelist::any(),
            overrides: None,
        }
    }

    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_whitelist(mut self, whitelist: EdgeWhitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_overrides(mut self, overrides: NodeTemplate) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Breadth-first expansion from the seeds
    ///
    /// Each round follows the outgoing edges of the current frontier and the
    /// edges pointing at it from documents not yet known. Seeds are never
    /// part of the result nodes. Stops early once a round discovers nothing.
    /// Edges whose far end does not materialize are kept.
    pub fn execute(&self, traversal: &Traversal<'_>, view: Option<&dyn View>) -> StorageResult<Graph> {
        let ctx = traversal.edges.context();
        let steps = self.steps.max(1);
        let incoming = traversal.adjacency_list(Direction::To, None, &self.whitelist)?;
        let overrides = self.overrides.as_ref();

        let mut known: HashSet<String> = self.seeds.iter().cloned().collect();
        let mut frontier: Vec<String> = Vec::new();
        for seed in &self.seeds {
            if !frontier.contains(seed) {
                frontier.push(seed.clone());
            }
        }

        let mut result = Graph::new();
        let mut rounds = 0;
        while rounds < steps && !frontier.is_empty() {
            rounds += 1;
            let mut discovered: Vec<String> = Vec::new();

            for title in &frontier {
                if ctx.store.is_system_or_draft(title)? {
                    continue;
                }

                let outgoing = traversal.edges.outgoing_edges(title, &self.whitelist)?;
                for edge in outgoing.values() {
                    let Some(to_title) = ctx.index.resolve_ref(&edge.to)? else {
                        continue;
                    };
                    if known.contains(&to_title) || result.nodes.contains_key(&edge.to) {
                        continue;
                    }
                    if let Some(node) = traversal.materializer.make_node(&to_title, overrides, view)? {
                        result.nodes.insert(edge.to.clone(), node);
                        discovered.push(to_title);
                    }
                }
                result.edges.extend(outgoing);

                let Some(id) = ctx.index.resolve(title)? else {
                    continue;
                };
                for edge in incoming.get(&id).into_iter().flatten() {
                    let from_title = ctx.index.resolve_ref(&edge.from)?;
                    if from_title.as_ref().is_some_and(|t| known.contains(t)) {
                        continue;
                    }
                    if let Some(from_title) = from_title {
                        if !result.nodes.contains_key(&edge.from) {
                            if let Some(node) =
                                traversal.materializer.make_node(&from_title, overrides, view)?
                            {
                                result.nodes.insert(edge.from.clone(), node);
                                discovered.push(from_title);
                            }
                        }
                    }
                    result.edges.insert(edge.id.clone(), edge.clone());
                }
            }

            known.extend(discovered.iter().cloned());
            frontier = discovered;
        }

        debug!(
            rounds,
            nodes = result.node_count(),
            edges = result.edge_count(),
            "computed neighbourhood"
        );
        Ok(result)
    }
}
