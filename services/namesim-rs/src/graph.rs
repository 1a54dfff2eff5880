//! The persisted similar-name graph: name → set of similar names.
//!
//! Nodes keep insertion order so tables round-trip line for line. Edge
//! sets are sorted, which is also the order they are written in.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use ahash::AHashMap;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{NameSimError, Result};

#[derive(Debug, Clone, Default)]
pub struct SimilarNameGraph {
    order: Vec<String>,
    edges: AHashMap<String, BTreeSet<String>>,
}

impl PartialEq for SimilarNameGraph {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
            && self
                .order
                .iter()
                .all(|name| self.edges.get(name) == other.edges.get(name))
    }
}

impl Eq for SimilarNameGraph {}

fn unquote(field: &str) -> Option<&str> {
    field.trim().strip_prefix('"')?.strip_suffix('"')
}

/// Split a `"name","a b c"` table line.
fn parse_table_line(line: &str) -> Option<(&str, impl Iterator<Item = &str>)> {
    let (name, similar) = line.split_once(',')?;
    let name = unquote(name)?;
    if name.is_empty() {
        return None;
    }
    let similar = unquote(similar)?;
    Some((name, similar.split(' ').filter(|s| !s.is_empty())))
}

impl SimilarNameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    /// Node names in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(String::as_str)
    }

    pub fn neighbors(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(name)
    }

    pub fn degree(&self, name: &str) -> usize {
        self.edges.get(name).map_or(0, BTreeSet::len)
    }

    /// Directed edge count.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.get(from).is_some_and(|set| set.contains(to))
    }

    /// Create a node with no edges. Returns false if it already exists.
    pub fn add_node(&mut self, name: &str) -> bool {
        if self.edges.contains_key(name) {
            return false;
        }
        self.order.push(name.to_string());
        self.edges.insert(name.to_string(), BTreeSet::new());
        true
    }

    /// Add `from → to`, creating `from` if needed.
    pub fn insert_edge(&mut self, from: &str, to: &str) -> bool {
        self.add_node(from);
        self.edges
            .get_mut(from)
            .is_some_and(|set| set.insert(to.to_string()))
    }

    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        self.edges
            .get_mut(from)
            .is_some_and(|set| set.remove(to))
    }

    pub(crate) fn neighbors_mut(&mut self, name: &str) -> Option<&mut BTreeSet<String>> {
        self.edges.get_mut(name)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NameSimError::io(path, e))?;
        let graph = Self::from_reader(file)?;
        debug!(path = %path.display(), nodes = graph.len(), "loaded similar-name table");
        Ok(graph)
    }

    /// Read `"name","a b c"` lines. Malformed lines are logged and skipped.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut graph = Self::new();
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let Some((name, similar)) = parse_table_line(&line) else {
                warn!(line_no = idx + 1, line = %line, "skipping malformed table line");
                continue;
            };
            if !graph.add_node(name) {
                warn!(line_no = idx + 1, name, "duplicate table row, merging");
            }
            for other in similar {
                graph.insert_edge(name, other);
            }
        }
        Ok(graph)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| NameSimError::io(path, e))?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| NameSimError::io(path, e))
    }

    pub fn write_to(&self, mut writer: impl Write) -> std::io::Result<()> {
        for name in &self.order {
            let similar = self.edges.get(name).into_iter().flatten();
            let joined = similar.map(String::as_str).collect::<Vec<_>>().join(" ");
            writeln!(writer, "\"{name}\",\"{joined}\"")?;
        }
        writer.flush()
    }

    /// Edges whose reverse is missing, in node order.
    pub fn asymmetric_edges(&self) -> Vec<(String, String)> {
        self.order
            .iter()
            .flat_map(|name| {
                self.edges[name.as_str()]
                    .iter()
                    .filter(move |other| !self.has_edge(other, name))
                    .map(move |other| (name.clone(), other.clone()))
            })
            .collect()
    }

    pub fn is_symmetric(&self) -> bool {
        self.asymmetric_edges().is_empty()
    }

    /// Add every missing reverse edge, creating nodes as needed.
    /// Returns the number of edges added.
    pub fn symmetrize(&mut self) -> usize {
        let missing = self.asymmetric_edges();
        for (from, to) in &missing {
            self.insert_edge(to, from);
        }
        missing.len()
    }

    pub fn stats(&self) -> GraphStats {
        let mut graph: UnGraph<&str, ()> = UnGraph::new_undirected();
        let mut node_map: AHashMap<&str, NodeIndex> = AHashMap::new();

        let mut num_edges = 0;
        for name in &self.order {
            let from = node_index(&mut graph, &mut node_map, name);
            for other in &self.edges[name.as_str()] {
                if name.as_str() < other.as_str() || !self.has_edge(other, name) {
                    let to = node_index(&mut graph, &mut node_map, other);
                    graph.add_edge(from, to, ());
                    num_edges += 1;
                }
            }
        }

        let num_nodes = self.order.len();
        let max_degree = self.edges.values().map(BTreeSet::len).max().unwrap_or(0);
        let avg_degree = if num_nodes > 0 {
            self.edge_count() as f64 / num_nodes as f64
        } else {
            0.0
        };

        GraphStats {
            num_nodes,
            num_edges,
            avg_degree,
            max_degree,
            asymmetric_edges: self.asymmetric_edges().len(),
            num_components: connected_components(&graph),
        }
    }
}

fn node_index<'a>(
    graph: &mut UnGraph<&'a str, ()>,
    node_map: &mut AHashMap<&'a str, NodeIndex>,
    name: &'a str,
) -> NodeIndex {
    *node_map.entry(name).or_insert_with(|| graph.add_node(name))
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    /// Unordered similar pairs.
    pub num_edges: usize,
    pub avg_degree: f64,
    pub max_degree: usize,
    pub asymmetric_edges: usize,
    pub num_components: usize,
}
