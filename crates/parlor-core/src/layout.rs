//! Standard settlement board layout.
//!
//! Produces a [`BoardConfig`] for the classic 19-tile island: three rings of
//! hexes, shuffled terrain, and dice numbers placed so that no 6 sits next to
//! an 8. Corners and edges are every hex-grid vertex and side touching land,
//! keyed by [`HexTopology`](crate::hex::HexTopology) ids.

use crate::graph::{BoardConfig, Corner, Edge, Tile};
use crate::hex::HexCoord;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Terrain of a land tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    Hills,
    Forest,
    Mountains,
    Fields,
    Pasture,
    Desert,
}

impl Terrain {
    pub fn name(&self) -> &'static str {
        match self {
            Terrain::Hills => "hills",
            Terrain::Forest => "forest",
            Terrain::Mountains => "mountains",
            Terrain::Fields => "fields",
            Terrain::Pasture => "pasture",
            Terrain::Desert => "desert",
        }
    }
}

/// 4 forest, 4 fields, 4 pasture, 3 mountains, 3 hills, 1 desert
const STANDARD_TERRAIN: [Terrain; 19] = [
    Terrain::Forest,
    Terrain::Forest,
    Terrain::Forest,
    Terrain::Forest,
    Terrain::Fields,
    Terrain::Fields,
    Terrain::Fields,
    Terrain::Fields,
    Terrain::Pasture,
    Terrain::Pasture,
    Terrain::Pasture,
    Terrain::Pasture,
    Terrain::Mountains,
    Terrain::Mountains,
    Terrain::Mountains,
    Terrain::Hills,
    Terrain::Hills,
    Terrain::Hills,
    Terrain::Desert,
];

/// One of each 2 and 12, two of everything else but 7
const STANDARD_NUMBERS: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];

const MAX_NUMBER_ATTEMPTS: usize = 100;

/// Standard board with a thread-local RNG
pub fn standard_board() -> BoardConfig {
    standard_board_with_rng(&mut rand::thread_rng())
}

/// Standard board with a caller RNG, for reproducible layouts
pub fn standard_board_with_rng<R: Rng>(rng: &mut R) -> BoardConfig {
    let land = HexCoord::new(0, 0).spiral(2);

    let mut terrain = STANDARD_TERRAIN;
    terrain.shuffle(rng);

    let producing: Vec<HexCoord> = land
        .iter()
        .zip(terrain.iter())
        .filter(|(_, t)| **t != Terrain::Desert)
        .map(|(hex, _)| *hex)
        .collect();
    let numbers = assign_numbers(&producing, rng);

    let tiles = land
        .iter()
        .zip(terrain.iter())
        .map(|(hex, terrain)| {
            let tile = Tile::new(hex.to_string())
                .with("q", hex.q)
                .with("r", hex.r)
                .with("terrain", terrain.name());
            match numbers.get(hex) {
                Some(&number) => tile.with("number", number).with("robber", false),
                None => tile.with("robber", true),
            }
        })
        .collect();

    let mut seen_corners = HashSet::new();
    let mut seen_edges = HashSet::new();
    let mut corners = Vec::new();
    let mut edges = Vec::new();
    for hex in &land {
        for vertex in hex.vertices() {
            if seen_corners.insert(vertex) {
                corners.push(Corner::new(vertex.to_string()));
            }
        }
        for edge in hex.edges() {
            if seen_edges.insert(edge) {
                edges.push(Edge::new(edge.to_string()));
            }
        }
    }

    BoardConfig {
        tiles,
        corners,
        edges,
    }
}

/// Shuffle dice numbers onto producing hexes, retrying to keep 6 and 8 apart.
/// Falls back to the last shuffle if no clean placement turns up.
fn assign_numbers<R: Rng>(hexes: &[HexCoord], rng: &mut R) -> HashMap<HexCoord, u8> {
    let mut numbers = STANDARD_NUMBERS;
    for _ in 0..MAX_NUMBER_ATTEMPTS {
        numbers.shuffle(rng);
        let placement: HashMap<HexCoord, u8> =
            hexes.iter().copied().zip(numbers.iter().copied()).collect();
        if !has_adjacent_hot_numbers(&placement) {
            return placement;
        }
    }
    hexes.iter().copied().zip(numbers.iter().copied()).collect()
}

fn has_adjacent_hot_numbers(placement: &HashMap<HexCoord, u8>) -> bool {
    let hot = |n: u8| n == 6 || n == 8;
    placement.iter().any(|(hex, &number)| {
        hot(number)
            && hex
                .neighbors()
                .iter()
                .any(|n| placement.get(n).is_some_and(|&other| hot(other)))
    })
}
