//! Longest road calculation over a [`BoardGraph`].
//!
//! A road network may not pass through a corner holding another player's
//! building. Every fork is explored on its own copy of the visited set, so both
//! arms of a branch are walked to full depth. The cost is exponential in the
//! number of forks, which is fine for boards of a few dozen edges; larger
//! boards have not been measured.

use crate::graph::{BoardGraph, Edge, PlayerId};
use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::trace;

/// Minimum road length that earns the longest road award
pub const MIN_LONGEST_ROAD: usize = 5;

/// Length (edge count) of `player`'s longest road, or 0 without any road.
pub fn longest_road<T: Topology>(graph: &BoardGraph, player: &str, topology: &T) -> usize {
    let explorer = PathExplorer {
        graph,
        topology,
        player,
    };

    let mut max_length = 0;
    for start in graph.player_roads(player) {
        let visited = HashSet::from([start.id.as_str()]);
        let length = explorer.extend(start, &visited);
        trace!(player, start = %start.id, length, "explored road");
        max_length = max_length.max(length);
    }
    max_length
}

struct PathExplorer<'a, T> {
    graph: &'a BoardGraph,
    topology: &'a T,
    player: &'a str,
}

impl<'a, T: Topology> PathExplorer<'a, T> {
    /// Longest path that starts with `current` (already in `visited`).
    fn extend(&self, current: &'a Edge, visited: &HashSet<&'a str>) -> usize {
        let mut max_continuation = 0;

        for endpoint in self.graph.edge_corners(&current.id, self.topology) {
            if endpoint.is_blocked_for(self.player) {
                continue;
            }

            for next in self.graph.corner_adjacent_edges(&endpoint.id, self.topology) {
                if next.id == current.id
                    || !next.is_road_of(self.player)
                    || visited.contains(next.id.as_str())
                {
                    continue;
                }

                let mut branch = visited.clone();
                branch.insert(next.id.as_str());
                max_continuation = max_continuation.max(self.extend(next, &branch));
            }
        }

        1 + max_continuation
    }
}

/// A change of the longest road holder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwardChange {
    pub previous: Option<PlayerId>,
    pub current: Option<PlayerId>,
    pub length: usize,
}

/// Decide who holds the longest road award after the board changed.
///
/// A unique leader at or above [`MIN_LONGEST_ROAD`] takes the award. A tie
/// keeps it with the current holder when the holder is among the tied players,
/// otherwise nobody holds it. Returns `None` when the holder is unchanged.
pub fn award_longest_road<T: Topology>(
    graph: &BoardGraph,
    topology: &T,
    players: &[PlayerId],
    current_holder: Option<&str>,
) -> Option<AwardChange> {
    let mut longest_length = 0;
    let mut leaders: Vec<&str> = Vec::new();

    for player in players {
        let length = longest_road(graph, player, topology);
        if length < MIN_LONGEST_ROAD {
            continue;
        }
        if length > longest_length {
            longest_length = length;
            leaders = vec![player.as_str()];
        } else if length == longest_length {
            leaders.push(player.as_str());
        }
    }

    let new_holder = match leaders.as_slice() {
        [only] => Some(*only),
        tied if current_holder.is_some_and(|h| tied.contains(&h)) => current_holder,
        _ => None,
    };

    if new_holder == current_holder {
        return None;
    }

    Some(AwardChange {
        previous: current_holder.map(str::to_string),
        current: new_holder.map(str::to_string),
        length: longest_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BoardConfig, BuildingKind, Corner};
    use crate::topology::AdjacencyTable;

    /// Build a board whose edges are given as `(edge, a, b)` triples.
    fn board(links: &[(&str, &str, &str)]) -> (BoardGraph, AdjacencyTable) {
        let mut topology = AdjacencyTable::new();
        let mut corners: Vec<String> = Vec::new();
        for (edge, a, b) in links {
            topology.link_edge(edge, a, b);
            for corner in [a, b] {
                if !corners.iter().any(|c| c == corner) {
                    corners.push(corner.to_string());
                }
            }
        }
        let config = BoardConfig {
            tiles: vec![],
            corners: corners.into_iter().map(Corner::new).collect(),
            edges: links.iter().map(|(e, _, _)| Edge::new(*e)).collect(),
        };
        (BoardGraph::create(config).unwrap(), topology)
    }

    #[test]
    fn test_no_roads_is_zero() {
        let (graph, topology) = board(&[("ab", "a", "b")]);
        assert_eq!(longest_road(&graph, "p1", &topology), 0);
    }

    #[test]
    fn test_single_road_is_one() {
        let (mut graph, topology) = board(&[("ab", "a", "b"), ("cd", "c", "d")]);
        graph.place_road("ab", "p1");
        assert_eq!(longest_road(&graph, "p1", &topology), 1);
    }

    #[test]
    fn test_opposing_building_severs_path() {
        let (mut graph, topology) = board(&[("ab", "a", "b"), ("bc", "b", "c")]);
        graph.place_road("ab", "p1");
        graph.place_road("bc", "p1");
        assert_eq!(longest_road(&graph, "p1", &topology), 2);

        graph.place_building("b", BuildingKind::Settlement, "p2");
        assert_eq!(longest_road(&graph, "p1", &topology), 1);
    }

    #[test]
    fn test_own_building_does_not_block() {
        let (mut graph, topology) = board(&[("ab", "a", "b"), ("bc", "b", "c")]);
        graph.place_road("ab", "p1");
        graph.place_road("bc", "p1");
        graph.place_building("b", BuildingKind::City, "p1");
        assert_eq!(longest_road(&graph, "p1", &topology), 2);
    }

    #[test]
    fn test_other_players_roads_are_ignored() {
        let (mut graph, topology) = board(&[("ab", "a", "b"), ("bc", "b", "c"), ("cd", "c", "d")]);
        graph.place_road("ab", "p1");
        graph.place_road("bc", "p2");
        graph.place_road("cd", "p1");
        assert_eq!(longest_road(&graph, "p1", &topology), 1);
        assert_eq!(longest_road(&graph, "p2", &topology), 1);
    }

    #[test]
    fn test_fork_explores_both_arms() {
        // a-b-c-d with a spur c-e-f. Both endpoints are checked at every
        // step, so f-e-c-d then back through c to b-a counts all 5 edges.
        let (mut graph, topology) = board(&[
            ("ab", "a", "b"),
            ("bc", "b", "c"),
            ("cd", "c", "d"),
            ("ce", "c", "e"),
            ("ef", "e", "f"),
        ]);
        for edge in ["ab", "bc", "cd", "ce", "ef"] {
            graph.place_road(edge, "p1");
        }
        assert_eq!(longest_road(&graph, "p1", &topology), 5);

        // Three roads meeting at c chain through it in any order
        let (mut graph, topology) = board(&[
            ("ab", "a", "b"),
            ("bc", "b", "c"),
            ("cd", "c", "d"),
            ("ce", "c", "e"),
        ]);
        for edge in ["ab", "bc", "cd"] {
            graph.place_road(edge, "p1");
        }
        assert_eq!(longest_road(&graph, "p1", &topology), 3);
        graph.place_road("ce", "p1");
        assert_eq!(longest_road(&graph, "p1", &topology), 4);
    }

    #[test]
    fn test_cycle_counts_each_edge_once() {
        let (mut graph, topology) = board(&[
            ("ab", "a", "b"),
            ("bc", "b", "c"),
            ("cd", "c", "d"),
            ("da", "d", "a"),
        ]);
        for edge in ["ab", "bc", "cd", "da"] {
            graph.place_road(edge, "p1");
        }
        assert_eq!(longest_road(&graph, "p1", &topology), 4);
    }

    #[test]
    fn test_award_goes_to_unique_leader() {
        let links: Vec<(String, String, String)> = (0..6)
            .map(|i| (format!("e{i}"), format!("c{i}"), format!("c{}", i + 1)))
            .collect();
        let refs: Vec<(&str, &str, &str)> = links
            .iter()
            .map(|(e, a, b)| (e.as_str(), a.as_str(), b.as_str()))
            .collect();
        let (mut graph, topology) = board(&refs);
        let players = vec!["p1".to_string(), "p2".to_string()];

        for i in 0..4 {
            graph.place_road(&format!("e{i}"), "p1");
        }
        assert_eq!(award_longest_road(&graph, &topology, &players, None), None);

        graph.place_road("e4", "p1");
        let change = award_longest_road(&graph, &topology, &players, None).unwrap();
        assert_eq!(change.previous, None);
        assert_eq!(change.current.as_deref(), Some("p1"));
        assert_eq!(change.length, 5);

        assert_eq!(award_longest_road(&graph, &topology, &players, Some("p1")), None);
    }

    #[test]
    fn test_award_is_lost_when_road_is_cut() {
        let links: Vec<(String, String, String)> = (0..5)
            .map(|i| (format!("e{i}"), format!("c{i}"), format!("c{}", i + 1)))
            .collect();
        let refs: Vec<(&str, &str, &str)> = links
            .iter()
            .map(|(e, a, b)| (e.as_str(), a.as_str(), b.as_str()))
            .collect();
        let (mut graph, topology) = board(&refs);
        for i in 0..5 {
            graph.place_road(&format!("e{i}"), "p1");
        }
        let players = vec!["p1".to_string(), "p2".to_string()];

        graph.place_building("c2", BuildingKind::Settlement, "p2");
        let change = award_longest_road(&graph, &topology, &players, Some("p1")).unwrap();
        assert_eq!(change.previous.as_deref(), Some("p1"));
        assert_eq!(change.current, None);
    }
}
