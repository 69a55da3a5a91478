//! Undirected adjacency view over the persisted definition mappings.
//!
//! The graph is rebuilt from the edge set on every call that needs it; edge sets are small
//! (tens of mappings) so nothing is cached between operations.

use crate::entities::definition_mapping;
use std::collections::{HashMap, HashSet, VecDeque};

/// Definition-level graph where every mapping is an undirected edge.
#[derive(Debug, Default, Clone)]
pub struct MappingGraph {
    adjacency: HashMap<i64, Vec<Neighbor>>,
}

#[derive(Debug, Clone, Copy)]
struct Neighbor {
    definition_id: i64,
    mapping_id: i64,
}

impl MappingGraph {
    /// Builds the graph from a set of mapping rows.
    #[must_use]
    pub fn from_mappings(mappings: &[definition_mapping::Model]) -> Self {
        let mut graph = Self::default();
        for mapping in mappings {
            graph.add_edge(
                mapping.id,
                mapping.source_definition_id,
                mapping.target_definition_id,
            );
        }
        graph
    }

    /// Adds an undirected edge between two definitions.
    pub fn add_edge(&mut self, mapping_id: i64, a: i64, b: i64) {
        self.adjacency.entry(a).or_default().push(Neighbor {
            definition_id: b,
            mapping_id,
        });
        self.adjacency.entry(b).or_default().push(Neighbor {
            definition_id: a,
            mapping_id,
        });
    }

    /// Breadth-first search for a path from `from` to `to`.
    ///
    /// Returns the definition ids along the path, both ends included, or `None` when the
    /// two definitions are in different components.
    #[must_use]
    pub fn find_path(&self, from: i64, to: i64) -> Option<Vec<i64>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut previous: HashMap<i64, i64> = HashMap::new();
        let mut visited: HashSet<i64> = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            let Some(neighbors) = self.adjacency.get(&current) else {
                continue;
            };
            for neighbor in neighbors {
                if !visited.insert(neighbor.definition_id) {
                    continue;
                }
                previous.insert(neighbor.definition_id, current);
                if neighbor.definition_id == to {
                    return Some(Self::unwind(&previous, from, to));
                }
                queue.push_back(neighbor.definition_id);
            }
        }

        None
    }

    /// Number of distinct mappings in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.adjacency
            .values()
            .flatten()
            .map(|n| n.mapping_id)
            .collect::<HashSet<_>>()
            .len()
    }

    fn unwind(previous: &HashMap<i64, i64>, from: i64, to: i64) -> Vec<i64> {
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            match previous.get(&current) {
                Some(&step) => {
                    path.push(step);
                    current = step;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }
}
