//! Name clusters: the coarse index used for candidate generation.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use ahash::AHashMap;
use tracing::{debug, info, warn};

use crate::error::{NameSimError, Result};
use crate::graph::SimilarNameGraph;

/// Union-Find data structure for connected components
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    /// Create new UnionFind with n elements
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    /// Find root with path compression
    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    /// Union by rank
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Less => {
                self.parent[root_x] = root_y;
            }
            std::cmp::Ordering::Greater => {
                self.parent[root_y] = root_x;
            }
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
    }

    /// Connected components, each in ascending element order, ordered by
    /// their smallest element.
    pub fn components(&mut self) -> Vec<Vec<usize>> {
        let n = self.parent.len();
        let mut slot_of_root: AHashMap<usize, usize> = AHashMap::new();
        let mut groups: Vec<Vec<usize>> = Vec::new();

        for i in 0..n {
            let root = self.find(i);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(i);
        }
        groups
    }
}

/// A representative name and the names it stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub representative: String,
    pub members: Vec<String>,
}

impl Cluster {
    /// The representative followed by the members.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::once(self.representative.as_str()).chain(self.members.iter().map(String::as_str))
    }
}

/// Split `rep: a, b c` on the first run of `:`/space, then members on `,`/space.
fn parse_cluster_line(line: &str) -> Option<Cluster> {
    let line = line.trim();
    let is_sep = |c: char| c == ':' || c == ' ';
    let (representative, rest) = match line.find(is_sep) {
        Some(at) => (&line[..at], line[at..].trim_start_matches(is_sep)),
        None => (line, ""),
    };
    if representative.is_empty() {
        return None;
    }
    let members = rest
        .split(|c: char| c == ',' || c == ' ')
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    Some(Cluster {
        representative: representative.to_string(),
        members,
    })
}

/// Clusters loaded once and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSet {
    clusters: Vec<Cluster>,
}

impl ClusterSet {
    pub fn new(clusters: Vec<Cluster>) -> Self {
        Self { clusters }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster> {
        self.clusters.iter()
    }

    pub fn as_slice(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Every name, cluster by cluster, representative first.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.clusters.iter().flat_map(Cluster::names)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| NameSimError::io(path, e))?;
        let clusters = Self::from_reader(file)?;
        debug!(path = %path.display(), clusters = clusters.len(), "loaded clusters");
        Ok(clusters)
    }

    /// Read `representative: member member ...` lines.
    /// Lines without a representative are logged and skipped.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut clusters = Vec::new();
        for (idx, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_cluster_line(&line) {
                Some(cluster) => clusters.push(cluster),
                None => warn!(line_no = idx + 1, line = %line, "skipping malformed cluster line"),
            }
        }
        Ok(Self { clusters })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| NameSimError::io(path, e))?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| NameSimError::io(path, e))
    }

    pub fn write_to(&self, mut writer: impl Write) -> std::io::Result<()> {
        for cluster in &self.clusters {
            if cluster.members.is_empty() {
                writeln!(writer, "{}:", cluster.representative)?;
            } else {
                writeln!(writer, "{}: {}", cluster.representative, cluster.members.join(" "))?;
            }
        }
        writer.flush()
    }
}

impl<'a> IntoIterator for &'a ClusterSet {
    type Item = &'a Cluster;
    type IntoIter = std::slice::Iter<'a, Cluster>;

    fn into_iter(self) -> Self::IntoIter {
        self.clusters.iter()
    }
}

/// Group a similar-name graph into clusters, one per connected component.
///
/// The representative is the member with the most similar names, ties going
/// to the lexicographically smallest. Members are sorted, and clusters are
/// ordered by representative.
pub fn build_clusters(graph: &SimilarNameGraph) -> ClusterSet {
    let mut names: Vec<&str> = graph.nodes().collect();
    let mut index: AHashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();
    for node in graph.nodes() {
        for other in graph.neighbors(node).into_iter().flatten() {
            if !index.contains_key(other.as_str()) {
                index.insert(other.as_str(), names.len());
                names.push(other.as_str());
            }
        }
    }

    let mut uf = UnionFind::new(names.len());
    for node in graph.nodes() {
        let from = index[node];
        for other in graph.neighbors(node).into_iter().flatten() {
            uf.union(from, index[other.as_str()]);
        }
    }

    let mut clusters: Vec<Cluster> = uf
        .components()
        .into_iter()
        .map(|component| {
            let mut members: Vec<&str> = component.into_iter().map(|i| names[i]).collect();
            members.sort_unstable();
            let representative = members
                .iter()
                .copied()
                .max_by(|a, b| graph.degree(a).cmp(&graph.degree(b)).then_with(|| b.cmp(a)))
                .unwrap_or_default()
                .to_string();
            Cluster {
                members: members
                    .into_iter()
                    .filter(|m| *m != representative)
                    .map(str::to_string)
                    .collect(),
                representative,
            }
        })
        .collect();
    clusters.sort_by(|a, b| a.representative.cmp(&b.representative));

    info!(clusters = clusters.len(), names = names.len(), "built clusters");
    ClusterSet::new(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_find() {
        let mut uf = UnionFind::new(5);
        uf.union(0, 1);
        uf.union(2, 3);
        uf.union(1, 2);

        assert_eq!(uf.find(0), uf.find(3));
        assert_ne!(uf.find(0), uf.find(4));
        assert_eq!(uf.components(), vec![vec![0, 1, 2, 3], vec![4]]);
    }

    #[test]
    fn test_parse_clusters() {
        let text = "quass: quast, quas quasse\nsmith:\nbrown\n: orphan\n\njones  jonas,jonez\n";
        let clusters = ClusterSet::from_reader(text.as_bytes()).unwrap();
        assert_eq!(clusters.len(), 4);
        assert_eq!(clusters.as_slice()[0].members, ["quast", "quas", "quasse"]);
        assert!(clusters.as_slice()[1].members.is_empty());
        assert_eq!(clusters.as_slice()[2].representative, "brown");
        assert_eq!(clusters.as_slice()[3].members, ["jonas", "jonez"]);
        let names: Vec<_> = clusters.names().take(3).collect();
        assert_eq!(names, ["quass", "quast", "quas"]);
    }

    #[test]
    fn test_write_and_reload() {
        let clusters = ClusterSet::new(vec![
            Cluster {
                representative: "ann".into(),
                members: vec!["anne".into(), "annie".into()],
            },
            Cluster {
                representative: "bob".into(),
                members: vec![],
            },
        ]);
        let mut out = Vec::new();
        clusters.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out.clone()).unwrap(), "ann: anne annie\nbob:\n");
        assert_eq!(ClusterSet::from_reader(out.as_slice()).unwrap(), clusters);
    }

    #[test]
    fn test_build_clusters() {
        let mut graph = SimilarNameGraph::new();
        for (a, b) in [("anne", "ann"), ("annie", "ann"), ("anne", "annie"), ("karl", "carl")] {
            graph.insert_edge(a, b);
            graph.insert_edge(b, a);
        }
        graph.add_node("zed");

        let clusters = build_clusters(&graph);
        let reps: Vec<_> = clusters.iter().map(|c| c.representative.as_str()).collect();
        // ann/anne/annie all have degree 2; carl/karl degree 1
        assert_eq!(reps, ["ann", "carl", "zed"]);
        assert_eq!(clusters.as_slice()[0].members, ["anne", "annie"]);
        assert_eq!(clusters.as_slice()[1].members, ["karl"]);
        assert!(clusters.as_slice()[2].members.is_empty());
    }

    #[test]
    fn test_missing_file_fails() {
        assert!(ClusterSet::from_file("/nonexistent/clusters.txt").is_err());
    }
}
