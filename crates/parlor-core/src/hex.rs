//! Hex coordinate system and the hex-grid [`Topology`].
//!
//! This module provides the coordinate types for pointy-top hex boards:
//! - `HexCoord`: identifies a tile (axial q, r)
//! - `VertexCoord`: identifies a corner as the North or South point of one hex
//! - `EdgeCoord`: identifies a side, canonicalized to the smaller hex
//!
//! Every coordinate has a stable string id (`h:q,r`, `c:q,r,N`, `e:q,r,NE`)
//! so hex boards can live in a [`BoardGraph`](crate::graph::BoardGraph), whose
//! entities are keyed by string.

use crate::graph::{Corner, Edge, Tile};
use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Direction of a vertex relative to a hex (North or South pole)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VertexDirection {
    North,
    South,
}

/// Direction of an edge relative to a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeDirection {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

impl EdgeDirection {
    /// All edge directions in clockwise order starting from NorthEast
    pub const ALL: [EdgeDirection; 6] = [
        EdgeDirection::NorthEast,
        EdgeDirection::East,
        EdgeDirection::SouthEast,
        EdgeDirection::SouthWest,
        EdgeDirection::West,
        EdgeDirection::NorthWest,
    ];

    pub fn opposite(self) -> Self {
        match self {
            EdgeDirection::NorthEast => EdgeDirection::SouthWest,
            EdgeDirection::East => EdgeDirection::West,
            EdgeDirection::SouthEast => EdgeDirection::NorthWest,
            EdgeDirection::SouthWest => EdgeDirection::NorthEast,
            EdgeDirection::West => EdgeDirection::East,
            EdgeDirection::NorthWest => EdgeDirection::SouthEast,
        }
    }

    fn code(self) -> &'static str {
        match self {
            EdgeDirection::NorthEast => "NE",
            EdgeDirection::East => "E",
            EdgeDirection::SouthEast => "SE",
            EdgeDirection::SouthWest => "SW",
            EdgeDirection::West => "W",
            EdgeDirection::NorthWest => "NW",
        }
    }
}

/// Failure to read a hex id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a hex board id: {0}")]
pub struct HexIdError(pub String);

/// Axial coordinate for hex grid.
///
/// `q` increases going east, `r` increases going southeast; the implicit third
/// coordinate satisfies q + r + s = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// The six neighboring hexes, clockwise from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            EdgeDirection::East,
            EdgeDirection::NorthEast,
            EdgeDirection::NorthWest,
            EdgeDirection::West,
            EdgeDirection::SouthWest,
            EdgeDirection::SouthEast,
        ]
        .map(|dir| self.neighbor(dir))
    }

    pub fn neighbor(&self, direction: EdgeDirection) -> HexCoord {
        match direction {
            EdgeDirection::East => HexCoord::new(self.q + 1, self.r),
            EdgeDirection::NorthEast => HexCoord::new(self.q + 1, self.r - 1),
            EdgeDirection::NorthWest => HexCoord::new(self.q, self.r - 1),
            EdgeDirection::West => HexCoord::new(self.q - 1, self.r),
            EdgeDirection::SouthWest => HexCoord::new(self.q - 1, self.r + 1),
            EdgeDirection::SouthEast => HexCoord::new(self.q, self.r + 1),
        }
    }

    /// Distance to another hex in hex steps
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Every hex within `radius` steps of this one, row by row
    pub fn spiral(&self, radius: i32) -> Vec<HexCoord> {
        let mut hexes = Vec::new();
        for dr in -radius..=radius {
            for dq in -radius..=radius {
                let hex = HexCoord::new(self.q + dq, self.r + dr);
                if self.distance_to(&hex) <= radius as u32 {
                    hexes.push(hex);
                }
            }
        }
        hexes
    }

    /// The six corners, clockwise from the top
    pub fn vertices(&self) -> [VertexCoord; 6] {
        [
            VertexCoord::new(*self, VertexDirection::North),
            VertexCoord::new(self.neighbor(EdgeDirection::NorthEast), VertexDirection::South),
            VertexCoord::new(self.neighbor(EdgeDirection::SouthEast), VertexDirection::North),
            VertexCoord::new(*self, VertexDirection::South),
            VertexCoord::new(self.neighbor(EdgeDirection::SouthWest), VertexDirection::North),
            VertexCoord::new(self.neighbor(EdgeDirection::NorthWest), VertexDirection::South),
        ]
    }

    pub fn edges(&self) -> [EdgeCoord; 6] {
        EdgeDirection::ALL.map(|dir| EdgeCoord::new(*self, dir))
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h:{},{}", self.q, self.r)
    }
}

impl FromStr for HexCoord {
    type Err = HexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_id(s, "h:", 2)?;
        let q = parse_axis(s, parts[0])?;
        let r = parse_axis(s, parts[1])?;
        Ok(HexCoord::new(q, r))
    }
}

/// Vertex coordinate - a corner where 3 hexes meet.
///
/// On a pointy-top grid every corner is the North point of exactly one hex or
/// the South point of exactly one hex, so `(hex, direction)` is already unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexCoord {
    pub hex: HexCoord,
    pub direction: VertexDirection,
}

impl VertexCoord {
    pub const fn new(hex: HexCoord, direction: VertexDirection) -> Self {
        Self { hex, direction }
    }

    /// The 3 hexes that touch this vertex
    pub fn touching_hexes(&self) -> [HexCoord; 3] {
        match self.direction {
            VertexDirection::North => [
                self.hex,
                self.hex.neighbor(EdgeDirection::NorthWest),
                self.hex.neighbor(EdgeDirection::NorthEast),
            ],
            VertexDirection::South => [
                self.hex,
                self.hex.neighbor(EdgeDirection::SouthWest),
                self.hex.neighbor(EdgeDirection::SouthEast),
            ],
        }
    }

    /// The 3 vertices one edge away
    pub fn adjacent_vertices(&self) -> [VertexCoord; 3] {
        self.touching_edges().map(|edge| {
            let [a, b] = edge.endpoints();
            if a == *self {
                b
            } else {
                a
            }
        })
    }

    /// The 3 edges that meet here
    pub fn touching_edges(&self) -> [EdgeCoord; 3] {
        match self.direction {
            VertexDirection::North => [
                EdgeCoord::new(self.hex, EdgeDirection::NorthWest),
                EdgeCoord::new(self.hex, EdgeDirection::NorthEast),
                EdgeCoord::new(self.hex.neighbor(EdgeDirection::NorthWest), EdgeDirection::East),
            ],
            VertexDirection::South => [
                EdgeCoord::new(self.hex, EdgeDirection::SouthWest),
                EdgeCoord::new(self.hex, EdgeDirection::SouthEast),
                EdgeCoord::new(self.hex.neighbor(EdgeDirection::SouthWest), EdgeDirection::East),
            ],
        }
    }
}

impl fmt::Display for VertexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pole = match self.direction {
            VertexDirection::North => "N",
            VertexDirection::South => "S",
        };
        write!(f, "c:{},{},{}", self.hex.q, self.hex.r, pole)
    }
}

impl FromStr for VertexCoord {
    type Err = HexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_id(s, "c:", 3)?;
        let hex = HexCoord::new(parse_axis(s, parts[0])?, parse_axis(s, parts[1])?);
        let direction = match parts[2] {
            "N" => VertexDirection::North,
            "S" => VertexDirection::South,
            _ => return Err(HexIdError(s.to_string())),
        };
        Ok(VertexCoord::new(hex, direction))
    }
}

/// Edge coordinate - a side shared by exactly 2 hexes.
///
/// Always stored in canonical form: described from the hex with the smaller
/// (q, r), so the same side compares equal whichever hex named it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeCoord {
    pub hex: HexCoord,
    pub direction: EdgeDirection,
}

impl EdgeCoord {
    pub fn new(hex: HexCoord, direction: EdgeDirection) -> Self {
        let other = hex.neighbor(direction);
        if (hex.q, hex.r) <= (other.q, other.r) {
            Self { hex, direction }
        } else {
            Self {
                hex: other,
                direction: direction.opposite(),
            }
        }
    }

    pub fn touching_hexes(&self) -> [HexCoord; 2] {
        [self.hex, self.hex.neighbor(self.direction)]
    }

    /// The 2 vertices at the ends of this edge
    pub fn endpoints(&self) -> [VertexCoord; 2] {
        let hex = self.hex;
        let north = |h: HexCoord| VertexCoord::new(h, VertexDirection::North);
        let south = |h: HexCoord| VertexCoord::new(h, VertexDirection::South);
        match self.direction {
            EdgeDirection::NorthEast => [north(hex), south(hex.neighbor(EdgeDirection::NorthEast))],
            EdgeDirection::East => [
                south(hex.neighbor(EdgeDirection::NorthEast)),
                north(hex.neighbor(EdgeDirection::SouthEast)),
            ],
            EdgeDirection::SouthEast => [north(hex.neighbor(EdgeDirection::SouthEast)), south(hex)],
            EdgeDirection::SouthWest => [south(hex), north(hex.neighbor(EdgeDirection::SouthWest))],
            EdgeDirection::West => [
                north(hex.neighbor(EdgeDirection::SouthWest)),
                south(hex.neighbor(EdgeDirection::NorthWest)),
            ],
            EdgeDirection::NorthWest => [south(hex.neighbor(EdgeDirection::NorthWest)), north(hex)],
        }
    }
}

impl fmt::Display for EdgeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e:{},{},{}", self.hex.q, self.hex.r, self.direction.code())
    }
}

impl FromStr for EdgeCoord {
    type Err = HexIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = split_id(s, "e:", 3)?;
        let hex = HexCoord::new(parse_axis(s, parts[0])?, parse_axis(s, parts[1])?);
        let direction = EdgeDirection::ALL
            .into_iter()
            .find(|d| d.code() == parts[2])
            .ok_or_else(|| HexIdError(s.to_string()))?;
        Ok(EdgeCoord::new(hex, direction))
    }
}

fn split_id<'a>(s: &'a str, prefix: &str, fields: usize) -> Result<Vec<&'a str>, HexIdError> {
    let body = s.strip_prefix(prefix).ok_or_else(|| HexIdError(s.to_string()))?;
    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() != fields {
        return Err(HexIdError(s.to_string()));
    }
    Ok(parts)
}

/// Largest axis magnitude an id may carry. Neighbor arithmetic never leaves
/// `i32` range inside it.
pub const MAX_AXIS: i32 = 1 << 20;

fn parse_axis(id: &str, part: &str) -> Result<i32, HexIdError> {
    part.parse::<i32>()
        .ok()
        .filter(|axis| (-MAX_AXIS..=MAX_AXIS).contains(axis))
        .ok_or_else(|| HexIdError(id.to_string()))
}

/// Pointy-top hex topology over `h:`/`c:`/`e:` ids.
///
/// Entities whose id does not parse have no neighbors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HexTopology;

fn ids<T: ToString>(coords: impl IntoIterator<Item = T>) -> Vec<String> {
    coords.into_iter().map(|c| c.to_string()).collect()
}

impl Topology for HexTopology {
    fn tile_corner_ids(&self, tile: &Tile) -> Vec<String> {
        tile.id
            .parse::<HexCoord>()
            .map(|hex| ids(hex.vertices()))
            .unwrap_or_default()
    }

    fn corner_tile_ids(&self, corner: &Corner) -> Vec<String> {
        corner
            .id
            .parse::<VertexCoord>()
            .map(|v| ids(v.touching_hexes()))
            .unwrap_or_default()
    }

    fn corner_edge_ids(&self, corner: &Corner) -> Vec<String> {
        corner
            .id
            .parse::<VertexCoord>()
            .map(|v| ids(v.touching_edges()))
            .unwrap_or_default()
    }

    fn edge_corner_ids(&self, edge: &Edge) -> Vec<String> {
        edge.id
            .parse::<EdgeCoord>()
            .map(|e| ids(e.endpoints()))
            .unwrap_or_default()
    }

    fn corner_corner_ids(&self, corner: &Corner) -> Vec<String> {
        corner
            .id
            .parse::<VertexCoord>()
            .map(|v| ids(v.adjacent_vertices()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors() {
        let center = HexCoord::new(0, 0);
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);
        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
        }
    }

    #[test]
    fn test_spiral_sizes() {
        let center = HexCoord::new(0, 0);
        assert_eq!(center.spiral(0), vec![center]);
        assert_eq!(center.spiral(1).len(), 7);
        assert_eq!(center.spiral(2).len(), 19);
    }

    #[test]
    fn test_edge_canonical_equality() {
        let e1 = EdgeCoord::new(HexCoord::new(0, 0), EdgeDirection::East);
        let e2 = EdgeCoord::new(HexCoord::new(1, 0), EdgeDirection::West);
        assert_eq!(e1, e2);
        assert_eq!(e1.to_string(), e2.to_string());
    }

    #[test]
    fn test_hex_has_six_distinct_vertices_and_edges() {
        let hex = HexCoord::new(0, 0);
        let vertices: HashSet<_> = hex.vertices().into_iter().collect();
        let edges: HashSet<_> = hex.edges().into_iter().collect();
        assert_eq!(vertices.len(), 6);
        assert_eq!(edges.len(), 6);
    }

    #[test]
    fn test_vertices_touch_their_hex() {
        let hex = HexCoord::new(1, -1);
        for vertex in hex.vertices() {
            assert!(vertex.touching_hexes().contains(&hex), "{vertex} should touch {hex}");
        }
    }

    #[test]
    fn test_vertex_edges_connection() {
        for hex in HexCoord::new(0, 0).spiral(1) {
            for v in hex.vertices() {
                for edge in v.touching_edges() {
                    assert!(edge.endpoints().contains(&v), "{edge} should end at {v}");
                }
            }
        }
    }

    #[test]
    fn test_edges_share_endpoints_with_their_hex() {
        let hex = HexCoord::new(0, 0);
        let vertices = hex.vertices();
        for edge in hex.edges() {
            for endpoint in edge.endpoints() {
                assert!(vertices.contains(&endpoint));
            }
        }
    }

    #[test]
    fn test_vertex_adjacent_vertices() {
        let v = VertexCoord::new(HexCoord::new(0, 0), VertexDirection::North);
        let adjacent: HashSet<_> = v.adjacent_vertices().into_iter().collect();
        assert_eq!(adjacent.len(), 3);
        assert!(!adjacent.contains(&v));
    }

    #[test]
    fn test_id_round_trips() {
        let hex = HexCoord::new(-2, 1);
        assert_eq!(hex.to_string(), "h:-2,1");
        assert_eq!("h:-2,1".parse::<HexCoord>(), Ok(hex));

        let vertex = VertexCoord::new(hex, VertexDirection::South);
        assert_eq!(vertex.to_string(), "c:-2,1,S");
        assert_eq!("c:-2,1,S".parse::<VertexCoord>(), Ok(vertex));

        let edge = EdgeCoord::new(hex, EdgeDirection::NorthWest);
        assert_eq!(edge.to_string().parse::<EdgeCoord>(), Ok(edge));
    }

    #[test]
    fn test_bad_ids_are_rejected() {
        assert!("x:0,0".parse::<HexCoord>().is_err());
        assert!("h:0".parse::<HexCoord>().is_err());
        assert!("c:0,0,X".parse::<VertexCoord>().is_err());
        assert!("e:0,0,UP".parse::<EdgeCoord>().is_err());
    }

    #[test]
    fn test_out_of_range_ids_have_no_neighbors() {
        assert!("e:2147483647,0,E".parse::<EdgeCoord>().is_err());
        assert!("c:0,-2147483648,N".parse::<VertexCoord>().is_err());
        assert!("h:1048577,0".parse::<HexCoord>().is_err());
        assert_eq!(
            format!("h:{MAX_AXIS},-{MAX_AXIS}").parse::<HexCoord>(),
            Ok(HexCoord::new(MAX_AXIS, -MAX_AXIS))
        );

        let edge = Edge::new("e:2147483647,0,E");
        assert!(HexTopology.edge_corner_ids(&edge).is_empty());
        let corner = Corner::new("c:2147483647,0,N");
        assert!(HexTopology.corner_edge_ids(&corner).is_empty());
        assert!(HexTopology.corner_corner_ids(&corner).is_empty());
    }

    #[test]
    fn test_topology_ids_match_coordinates() {
        let edge = EdgeCoord::new(HexCoord::new(0, 0), EdgeDirection::East);
        let ends = HexTopology.edge_corner_ids(&Edge::new(edge.to_string()));
        assert_eq!(ends.len(), 2);
        for end in &ends {
            let corner = Corner::new(end.clone());
            assert!(HexTopology.corner_edge_ids(&corner).contains(&edge.to_string()));
        }
        assert!(HexTopology.tile_corner_ids(&Tile::new("garbage")).is_empty());
    }
}
