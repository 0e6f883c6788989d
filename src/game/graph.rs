//! Journey graph for visualizers.
//!
//! The player's path is turned into nodes (one per distinct cell) and links
//! (one per step). A renderer can take the full graph once and then apply
//! the small updates returned by [`JourneyGraph::extend`] after each move.
//! Node ids are the cell keys (`"x,y"`), so both forms refer to the same
//! entities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::map::Coord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

/// The whole journey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

/// What changed since the previous call, plus the node the player now stands on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphUpdate {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub current_node: Option<GraphNode>,
}

#[derive(Debug, Default)]
pub struct JourneyGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    links: Vec<GraphLink>,
    /// Length of the path already folded into the graph.
    seen: usize,
}

impl JourneyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the graph from scratch.
    pub fn rebuild<F>(&mut self, path: &[Coord], label: F) -> GraphData
    where
        F: Fn(Coord) -> String,
    {
        *self = Self::default();
        self.absorb(path, &label);
        GraphData {
            nodes: self.nodes.clone(),
            links: self.links.clone(),
        }
    }

    /// Fold in the cells appended since the last call and return only the new
    /// nodes and links. A path that shrank is treated as a fresh journey.
    pub fn extend<F>(&mut self, path: &[Coord], label: F) -> GraphUpdate
    where
        F: Fn(Coord) -> String,
    {
        if path.len() < self.seen {
            *self = Self::default();
        }
        let (node_mark, link_mark) = (self.nodes.len(), self.links.len());
        self.absorb(path, &label);
        let current_node = path
            .last()
            .and_then(|c| self.index.get(&c.key()))
            .map(|i| self.nodes[*i].clone());
        GraphUpdate {
            nodes: self.nodes[node_mark..].to_vec(),
            links: self.links[link_mark..].to_vec(),
            current_node,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    fn absorb<F>(&mut self, path: &[Coord], label: &F)
    where
        F: Fn(Coord) -> String,
    {
        for i in self.seen..path.len() {
            let cell = path[i];
            let id = cell.key();
            if !self.index.contains_key(&id) {
                self.index.insert(id.clone(), self.nodes.len());
                self.nodes.push(GraphNode {
                    id: id.clone(),
                    label: label(cell),
                });
            }
            if i > 0 {
                self.links.push(GraphLink {
                    source: path[i - 1].key(),
                    target: id,
                });
            }
        }
        self.seen = path.len();
    }
}
