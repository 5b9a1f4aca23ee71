//! Graph Assembler: match set, its edges and an optional neighbourhood

use super::GraphAdapter;
use crate::codec::EdgeWhitelist;
use crate::config::{GROUP_MATCHES, GROUP_NEIGHBOURS};
use crate::graph::{EdgeTypeId, Graph, NodeTemplate};
use crate::query::{AdjacencyList, Direction, NeighbourhoodQuery};
use crate::storage::StorageResult;
use crate::view::{View, SHOW_INTER_NEIGHBOUR_EDGES};
use std::collections::HashSet;
use tracing::debug;

/// Options of a graph request
///
/// Explicit values take precedence over the view's configuration.
#[derive(Default, Clone, Copy)]
pub struct GraphOptions<'a> {
    pub view: Option<&'a dyn View>,
    /// Node filter; replaces the view's node filter
    pub filter: Option<&'a str>,
    /// Edge type filter; replaces the view's edge filter
    pub edge_filter: Option<&'a str>,
    /// Neighbourhood depth; replaces the view's setting
    pub neighbourhood_scope: Option<usize>,
}

impl<'a> GraphOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view(mut self, view: &'a dyn View) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_filter(mut self, filter: &'a str) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_edge_filter(mut self, filter: &'a str) -> Self {
        self.edge_filter = Some(filter);
        self
    }

    pub fn with_neighbourhood_scope(mut self, scope: usize) -> Self {
        self.neighbourhood_scope = Some(scope);
        self
    }
}

impl GraphAdapter {
    /// Edge types accepted by a filter, out of all known types
    ///
    /// The filter is evaluated over the type ids. Without a filter every
    /// known type is accepted.
    pub fn edge_type_whitelist(&self, filter: Option<&str>) -> StorageResult<HashSet<EdgeTypeId>> {
        let universe: Vec<String> = self
            .edges
            .known_types()?
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect();
        let accepted = match filter {
            Some(filter) => self.selector.evaluate(filter, Some(&universe))?,
            None => universe,
        };
        Ok(accepted.into_iter().map(EdgeTypeId::from).collect())
    }

    /// Edges grouped by one endpoint, over all potential nodes
    pub fn adjacency_list(
        &self,
        direction: Direction,
        whitelist: &EdgeWhitelist,
    ) -> StorageResult<AdjacencyList> {
        self.traversal().adjacency_list(direction, None, whitelist)
    }

    /// Neighbourhood of a set of documents
    pub fn get_neighbours(
        &self,
        query: &NeighbourhoodQuery,
        view: Option<&dyn View>,
    ) -> StorageResult<Graph> {
        query.execute(&self.traversal(), view)
    }

    /// Assemble the graph of a node and edge selection
    ///
    /// Matching nodes are tagged `matches` and connected by the edges among
    /// them. With a positive neighbourhood depth the neighbourhood is merged
    /// in, its nodes tagged `neighbours`. If the view enables it, edges
    /// between neighbours are added as well; the edge filter does not apply
    /// to those.
    pub fn get_graph(&self, options: &GraphOptions<'_>) -> StorageResult<Graph> {
        let view = options.view;
        let filter = options
            .filter
            .map(str::to_string)
            .or_else(|| view.and_then(|v| v.node_filter()));
        let matches = match filter {
            Some(filter) => self.selector.evaluate(&filter, None)?,
            None => Vec::new(),
        };

        let edge_filter = options
            .edge_filter
            .map(str::to_string)
            .or_else(|| view.and_then(|v| v.edge_filter()));
        let types = match edge_filter {
            Some(filter) => Some(self.edge_type_whitelist(Some(&filter))?),
            None => None,
        };

        let whitelist = EdgeWhitelist::any()
            .with_targets(matches.iter().cloned())
            .with_type_set(types.clone());
        let mut graph = Graph::with_parts(
            self.materializer
                .select_by_refs(&matches, Some(&NodeTemplate::group(GROUP_MATCHES)), view)?,
            self.edges.edges_for_set(&matches, &whitelist)?,
        );

        let scope = options
            .neighbourhood_scope
            .unwrap_or_else(|| view.map_or(0, |v| v.neighbourhood_scope()));
        if scope > 0 {
            let query = NeighbourhoodQuery::from(matches.iter().cloned())
                .steps(scope)
                .with_whitelist(EdgeWhitelist::any().with_type_set(types))
                .with_overrides(NodeTemplate::group(GROUP_NEIGHBOURS));
            let neighbours = self.get_neighbours(&query, view)?;
            let neighbour_refs = self.index.resolve_refs(neighbours.nodes.keys())?;
            graph.merge(neighbours);

            if view.is_some_and(|v| v.is_enabled(SHOW_INTER_NEIGHBOUR_EDGES)) {
                let whitelist = EdgeWhitelist::any().with_targets(neighbour_refs.iter().cloned());
                graph.add_edges(self.edges.edges_for_set(&neighbour_refs, &whitelist)?);
            }
        }

        debug!(
            matches = matches.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            scope,
            "assembled graph"
        );
        Ok(graph)
    }

    /// Selector expression matching every node of the view's graph
    pub fn get_collection_filter(&self, view: &dyn View) -> StorageResult<String> {
        let graph = self.get_graph(&GraphOptions::new().with_view(view))?;
        let field = self.index.id_field();
        Ok(graph
            .node_ids()
            .iter()
            .map(|id| format!("[[field:{}={}]]", field, id))
            .collect::<Vec<_>>()
            .join(" "))
    }
}
