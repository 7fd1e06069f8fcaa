//! Adjacency capabilities supplied by callers.
//!
//! The board graph never stores topology. Every neighbor query takes a
//! [`Topology`] at call time and resolves the ids it returns against the
//! graph's collections, silently dropping any id that does not resolve.

use crate::graph::{Corner, Edge, Tile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Neighbor resolution for one board shape.
///
/// Implementations are pure: the same entity always maps to the same ids.
pub trait Topology {
    /// Corners touching a tile
    fn tile_corner_ids(&self, tile: &Tile) -> Vec<String>;
    /// Tiles touching a corner
    fn corner_tile_ids(&self, corner: &Corner) -> Vec<String>;
    /// Edges meeting at a corner
    fn corner_edge_ids(&self, corner: &Corner) -> Vec<String>;
    /// The endpoints of an edge
    fn edge_corner_ids(&self, edge: &Edge) -> Vec<String>;
    /// Corners one edge away from a corner
    fn corner_corner_ids(&self, corner: &Corner) -> Vec<String>;
}

impl<T: Topology + ?Sized> Topology for &T {
    fn tile_corner_ids(&self, tile: &Tile) -> Vec<String> {
        (**self).tile_corner_ids(tile)
    }

    fn corner_tile_ids(&self, corner: &Corner) -> Vec<String> {
        (**self).corner_tile_ids(corner)
    }

    fn corner_edge_ids(&self, corner: &Corner) -> Vec<String> {
        (**self).corner_edge_ids(corner)
    }

    fn edge_corner_ids(&self, edge: &Edge) -> Vec<String> {
        (**self).edge_corner_ids(edge)
    }

    fn corner_corner_ids(&self, corner: &Corner) -> Vec<String> {
        (**self).corner_corner_ids(corner)
    }
}

/// An explicit, serializable topology: plain id-to-ids lists.
///
/// Used when the board shape has to cross a process boundary (a client sends
/// its own layout) or when a test wants a tiny hand-built graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjacencyTable {
    #[serde(default)]
    pub tile_corners: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub corner_tiles: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub corner_edges: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub edge_corners: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub corner_corners: HashMap<String, Vec<String>>,
}

impl AdjacencyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect two corners with an edge, recording all three directions.
    pub fn link_edge(&mut self, edge: &str, a: &str, b: &str) -> &mut Self {
        self.edge_corners
            .insert(edge.to_string(), vec![a.to_string(), b.to_string()]);
        for (corner, other) in [(a, b), (b, a)] {
            push_unique(&mut self.corner_edges, corner, edge);
            push_unique(&mut self.corner_corners, corner, other);
        }
        self
    }

    /// Attach a tile to the corners around it.
    pub fn link_tile(&mut self, tile: &str, corners: &[&str]) -> &mut Self {
        for corner in corners {
            push_unique(&mut self.tile_corners, tile, corner);
            push_unique(&mut self.corner_tiles, corner, tile);
        }
        self
    }

    fn lookup(map: &HashMap<String, Vec<String>>, id: &str) -> Vec<String> {
        map.get(id).cloned().unwrap_or_default()
    }
}

fn push_unique(map: &mut HashMap<String, Vec<String>>, key: &str, value: &str) {
    let ids = map.entry(key.to_string()).or_default();
    if !ids.iter().any(|id| id == value) {
        ids.push(value.to_string());
    }
}

impl Topology for AdjacencyTable {
    fn tile_corner_ids(&self, tile: &Tile) -> Vec<String> {
        Self::lookup(&self.tile_corners, &tile.id)
    }

    fn corner_tile_ids(&self, corner: &Corner) -> Vec<String> {
        Self::lookup(&self.corner_tiles, &corner.id)
    }

    fn corner_edge_ids(&self, corner: &Corner) -> Vec<String> {
        Self::lookup(&self.corner_edges, &corner.id)
    }

    fn edge_corner_ids(&self, edge: &Edge) -> Vec<String> {
        Self::lookup(&self.edge_corners, &edge.id)
    }

    fn corner_corner_ids(&self, corner: &Corner) -> Vec<String> {
        Self::lookup(&self.corner_corners, &corner.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_edge_is_symmetric() {
        let mut table = AdjacencyTable::new();
        table.link_edge("ab", "a", "b");

        assert_eq!(table.edge_corners["ab"], vec!["a", "b"]);
        assert_eq!(table.corner_edges["a"], vec!["ab"]);
        assert_eq!(table.corner_edges["b"], vec!["ab"]);
        assert_eq!(table.corner_corners["a"], vec!["b"]);
        assert_eq!(table.corner_corners["b"], vec!["a"]);
    }

    #[test]
    fn test_link_tile_does_not_duplicate() {
        let mut table = AdjacencyTable::new();
        table.link_tile("t", &["a", "b"]).link_tile("t", &["b", "c"]);

        assert_eq!(table.tile_corners["t"], vec!["a", "b", "c"]);
        assert_eq!(table.corner_tiles["b"], vec!["t"]);
    }

    #[test]
    fn test_unknown_ids_resolve_to_nothing() {
        let table = AdjacencyTable::new();
        let edge = Edge::new("missing");
        assert!(table.edge_corner_ids(&edge).is_empty());
    }

    #[test]
    fn test_table_json_uses_camel_case() {
        let mut table = AdjacencyTable::new();
        table.link_edge("ab", "a", "b");
        let json = serde_json::to_value(&table).unwrap();
        assert!(json.get("edgeCorners").is_some());
        assert!(json.get("cornerEdges").is_some());
    }
}
