//! Batch maintenance of similar-name tables: add, augment, prune.
//!
//! These are offline single-writer jobs over one [`SimilarNameGraph`].
//! Bad input lines are logged and skipped; they never abort a run.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeSet, BinaryHeap};

use ahash::{AHashMap, AHashSet};
use namesim_phonetic::CodeKind;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::generator::SimilarNameGenerator;
use crate::graph::SimilarNameGraph;
use crate::normalize::NameNormalizer;
use crate::scorer::Scorer;
use crate::types::{NameScore, NameType};

/// Add a row for every new name piece, filled by the generator.
///
/// Each line is `name[,:]ignored`. Names are normalized into pieces; pieces
/// of one letter or already in the graph are skipped. Existing rows are
/// never touched. At most `max_new` rows are added. Returns the new names.
pub fn add_names<'a>(
    graph: &mut SimilarNameGraph,
    generator: &SimilarNameGenerator,
    normalizer: &dyn NameNormalizer,
    name_type: NameType,
    lines: impl IntoIterator<Item = &'a str>,
    max_new: Option<usize>,
) -> Vec<String> {
    let limit = max_new.unwrap_or(usize::MAX);
    let mut seen: AHashSet<String> = graph.nodes().map(str::to_string).collect();
    let mut new_names = Vec::new();

    'lines: for line in lines {
        let raw = line.split([',', ':']).next().unwrap_or_default();
        for piece in normalizer.normalize(raw, name_type) {
            if new_names.len() >= limit {
                break 'lines;
            }
            if piece.len() > 1 && seen.insert(piece.clone()) {
                new_names.push(piece);
            }
        }
    }

    let rows: Vec<Vec<String>> = new_names
        .par_iter()
        .map(|name| generator.similar_names(name))
        .collect();

    for (name, similar) in new_names.iter().zip(rows) {
        graph.add_node(name);
        for other in similar {
            graph.insert_edge(name, &other);
        }
    }
    info!(added = new_names.len(), nodes = graph.len(), "added names");
    new_names
}

/// Which combinations of a line's names to add.
#[derive(Debug, Clone, Copy)]
pub struct AugmentOptions {
    /// Also add the first name to each other name's row.
    pub pairwise: bool,
    /// Also add every other name to every other name's row.
    pub all_combos: bool,
    /// Near-duplicate filter for uncommon sources.
    pub code: CodeKind,
}

impl Default for AugmentOptions {
    fn default() -> Self {
        Self {
            pairwise: false,
            all_combos: false,
            code: CodeKind::Soundex,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentReport {
    pub edges_added: usize,
    /// Sources dropped because their target is not a node.
    pub uncommon_targets: usize,
    pub invalid_lines: usize,
}

struct Augmenter<'g> {
    graph: &'g mut SimilarNameGraph,
    normalizer: &'g dyn NameNormalizer,
    name_type: NameType,
    code: CodeKind,
    pairwise: bool,
    all_combos: bool,
    report: AugmentReport,
}

impl Augmenter<'_> {
    fn single_piece(&self, raw: &str) -> Option<String> {
        let mut pieces = self.normalizer.normalize(raw, self.name_type);
        if pieces.len() == 1 {
            pieces.pop()
        } else {
            None
        }
    }

    fn codes(&self, source: &str, target: &str) -> Result<(String, String)> {
        Ok((self.code.encode(source)?, self.code.encode(target)?))
    }

    /// Add `source` to `target`'s row if the rules allow. False when the
    /// pair is unusable.
    fn add(&mut self, target: &str, source: &str) -> bool {
        let (Some(target), Some(source)) = (self.single_piece(target), self.single_piece(source)) else {
            return false;
        };
        if source == target {
            return true;
        }
        let (source_code, target_code) = match self.codes(&source, &target) {
            Ok(codes) => codes,
            Err(err) => {
                warn!(%err, name = %target, similar = %source, "cannot encode augment pair");
                return false;
            }
        };

        if self.graph.contains(&target) {
            if (self.graph.contains(&source) || source_code != target_code)
                && self.graph.insert_edge(&target, &source)
            {
                self.report.edges_added += 1;
            }
        } else if source_code != target_code {
            self.report.uncommon_targets += 1;
            debug!(name = %target, similar = %source, "source not added to uncommon target");
        }
        true
    }

    fn line(&mut self, line: &str) -> bool {
        let fields: Vec<&str> = line
            .split([':', ',', ' '])
            .filter(|f| !f.is_empty())
            .collect();
        let Some((&first, rest)) = fields.split_first() else {
            return true;
        };
        let (pairwise, all_combos) = (self.pairwise, self.all_combos);
        for (i, &other) in rest.iter().enumerate() {
            if !self.add(first, other) {
                return false;
            }
            if pairwise || all_combos {
                if !self.add(other, first) {
                    return false;
                }
                if all_combos {
                    for (j, &third) in rest.iter().enumerate() {
                        if i != j && !self.add(other, third) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

/// Add explicit `target: source source ...` pairs to existing rows.
///
/// A source joins a target's row only when the target is already a node
/// ("common"), and the source is common too or its phonetic code differs
/// from the target's. Nodes are never created. A line stops at its first
/// unusable pair and is counted invalid.
pub fn augment<'a>(
    graph: &mut SimilarNameGraph,
    normalizer: &dyn NameNormalizer,
    name_type: NameType,
    lines: impl IntoIterator<Item = &'a str>,
    options: AugmentOptions,
) -> AugmentReport {
    let mut augmenter = Augmenter {
        graph,
        normalizer,
        name_type,
        code: options.code,
        pairwise: options.pairwise,
        all_combos: options.all_combos,
        report: AugmentReport::default(),
    };
    for line in lines {
        if !augmenter.line(line) {
            augmenter.report.invalid_lines += 1;
            warn!(line, "invalid augment line");
        }
    }
    let report = augmenter.report;
    info!(
        edges_added = report.edges_added,
        uncommon_targets = report.uncommon_targets,
        invalid_lines = report.invalid_lines,
        "augmented similar names"
    );
    report
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub nodes_pruned: usize,
    pub edges_removed: usize,
    /// Dropped edges whose reverse was already missing.
    pub missing_reverse: usize,
}

/// Names to drop from `name`'s row: the `excess` lowest scores, ties
/// dropping the lexicographically later name first.
fn least_similar(scorer: &Scorer, name: &str, similar: &BTreeSet<String>, excess: usize) -> Vec<String> {
    let codes = scorer.codes(name);
    let mut scored: Vec<NameScore> = similar
        .par_iter()
        .map(|other| {
            let score = scorer.score_codes(name, &codes, other, &scorer.codes(other));
            NameScore::new(other.as_str(), score)
        })
        .collect();
    // best-first order, so the tail holds the names to drop
    scored.sort();
    scored
        .into_iter()
        .rev()
        .take(excess)
        .map(|s| s.name)
        .collect()
}

/// Greedily bound every node's degree to `max_edges`.
///
/// Repeatedly takes the node with the most edges (earliest node on ties),
/// drops its lowest-scoring edges, and removes each dropped edge's reverse.
/// Degrees only shrink, so stale heap entries are skipped on pop.
pub fn prune(graph: &mut SimilarNameGraph, scorer: &Scorer, max_edges: usize) -> PruneReport {
    let order: Vec<String> = graph.nodes().map(str::to_string).collect();
    let position: AHashMap<&str, usize> =
        order.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();
    let mut heap: BinaryHeap<(usize, Reverse<usize>)> = order
        .iter()
        .enumerate()
        .map(|(i, n)| (graph.degree(n), Reverse(i)))
        .filter(|(degree, _)| *degree > max_edges)
        .collect();
    let mut report = PruneReport::default();

    while let Some((degree, Reverse(idx))) = heap.pop() {
        let name = order[idx].as_str();
        if graph.degree(name) != degree {
            continue;
        }
        let Some(similar) = graph.neighbors(name) else {
            continue;
        };
        let dropped = least_similar(scorer, name, similar, degree - max_edges);
        report.nodes_pruned += 1;

        for other in &dropped {
            graph.remove_edge(name, other);
            report.edges_removed += 1;
            match graph.neighbors_mut(other) {
                None => {
                    report.missing_reverse += 1;
                    warn!(name, other = %other, "similar name is not a node");
                }
                Some(reverse) => {
                    if !reverse.remove(name) {
                        report.missing_reverse += 1;
                        warn!(name, other = %other, "reverse edge missing");
                    }
                    let other_degree = reverse.len();
                    if other_degree > max_edges {
                        if let Some(&other_idx) = position.get(other.as_str()) {
                            heap.push((other_degree, Reverse(other_idx)));
                        }
                    }
                }
            }
        }
    }

    info!(
        nodes_pruned = report.nodes_pruned,
        edges_removed = report.edges_removed,
        max_edges,
        "pruned similar names"
    );
    report
}

/// Exhaustive table: for each name in `names[begin..begin + count]`, the
/// names sorting after it that score at least `threshold`.
///
/// Only the `name < other` half is computed; run [`SimilarNameGraph::symmetrize`]
/// on the merged partitions to fill in reverse edges.
pub fn pairwise_table(
    scorer: &Scorer,
    names: &[String],
    threshold: f64,
    begin: usize,
    count: Option<usize>,
) -> SimilarNameGraph {
    let end = count.map_or(names.len(), |c| begin.saturating_add(c).min(names.len()));
    let begin = begin.min(end);
    let codes: Vec<_> = names.par_iter().map(|n| scorer.codes(n)).collect();

    let rows: Vec<Vec<&str>> = (begin..end)
        .into_par_iter()
        .map(|i| {
            let name = names[i].as_str();
            names
                .iter()
                .zip(&codes)
                .filter(|(other, _)| name.cmp(other.as_str()) == Ordering::Less)
                .filter(|(other, other_codes)| {
                    scorer.score_codes(name, &codes[i], other, other_codes) >= threshold
                })
                .map(|(other, _)| other.as_str())
                .collect()
        })
        .collect();

    let mut graph = SimilarNameGraph::new();
    for (name, similar) in names[begin..end].iter().zip(rows) {
        graph.add_node(name);
        for other in similar {
            graph.insert_edge(name, other);
        }
    }
    info!(rows = graph.len(), begin, end, "built pairwise table");
    graph
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use namesim_phonetic::DmSoundex;

    use super::*;
    use crate::cluster::ClusterSet;
    use crate::config::GeneratorConfig;
    use crate::cost_matrix::CostMatrix;
    use crate::features::{FeatureVector, FeaturesGenerator};
    use crate::lattice::WeightedEditDistance;
    use crate::normalize::SimpleNormalizer;
    use crate::tokenizer::{LetterRules, PhonemeTokenizer};

    fn scorer() -> Scorer {
        let features = FeaturesGenerator::new(
            NameType::Given,
            PhonemeTokenizer::new(Arc::new(LetterRules)),
            WeightedEditDistance::new(Arc::new(CostMatrix::uniform(2, 10, 8)), 1.0),
            DmSoundex::default(),
        );
        Scorer::new(features, Arc::new(|f: &FeatureVector| -f.levenshtein))
    }

    fn table(text: &str) -> SimilarNameGraph {
        SimilarNameGraph::from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_add_names() {
        let clusters = ClusterSet::from_reader("carl: karl carla\n".as_bytes()).unwrap();
        let config = GeneratorConfig {
            classifier_threshold: -1.0,
            cluster_threshold: -10.0,
            max_names: None,
            use_clusters: true,
        };
        let generator = SimilarNameGenerator::new(scorer(), &clusters, config);
        let mut graph = table("\"carl\",\"karl\"\n");

        let added = add_names(
            &mut graph,
            &generator,
            &SimpleNormalizer::default(),
            NameType::Given,
            ["Carle, b. 1850", "carl", "x", "Karla Carle"],
            None,
        );
        assert_eq!(added, ["carle", "karla"]);
        // existing row untouched
        assert_eq!(graph.degree("carl"), 1);
        let carle: Vec<_> = graph.neighbors("carle").unwrap().iter().cloned().collect();
        assert_eq!(carle, ["carl", "carla"]);
        assert!(graph.contains("karla"));
    }

    #[test]
    fn test_add_names_limit() {
        let generator = SimilarNameGenerator::flat(scorer(), ["ann"], GeneratorConfig::for_name_type(NameType::Given));
        let mut graph = SimilarNameGraph::new();
        let added = add_names(
            &mut graph,
            &generator,
            &SimpleNormalizer::default(),
            NameType::Given,
            ["bob", "tom", "jim"],
            Some(2),
        );
        assert_eq!(added, ["bob", "tom"]);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn test_augment_rules() {
        let mut graph = table("\"smith\",\"\"\n\"smyth\",\"\"\n\"jones\",\"\"\n");
        let report = augment(
            &mut graph,
            &SimpleNormalizer::default(),
            NameType::Surname,
            [
                // common source with the same soundex: added
                "smith: smyth",
                // uncommon source with the same soundex: filtered
                "smith: smithe",
                // uncommon source with a different soundex: added
                "jones: johnson",
                // uncommon target: nothing
                "brown: braun, green",
            ],
            AugmentOptions::default(),
        );
        assert!(graph.has_edge("smith", "smyth"));
        assert!(!graph.has_edge("smith", "smithe"));
        assert!(graph.has_edge("jones", "johnson"));
        assert!(!graph.contains("brown"));
        assert_eq!(report.edges_added, 2);
        assert_eq!(report.uncommon_targets, 1);
        assert_eq!(report.invalid_lines, 0);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_augment_combinations() {
        let text = "\"ann\",\"\"\n\"anna\",\"\"\n\"hannah\",\"\"\n";
        let mut pairwise = table(text);
        let options = AugmentOptions {
            pairwise: true,
            ..AugmentOptions::default()
        };
        augment(&mut pairwise, &SimpleNormalizer::default(), NameType::Given, ["ann anna hannah"], options);
        assert!(pairwise.has_edge("ann", "hannah"));
        assert!(pairwise.has_edge("hannah", "ann"));
        assert!(!pairwise.has_edge("anna", "hannah"));

        let mut all = table(text);
        let options = AugmentOptions {
            all_combos: true,
            ..AugmentOptions::default()
        };
        augment(&mut all, &SimpleNormalizer::default(), NameType::Given, ["ann anna hannah"], options);
        assert!(all.has_edge("anna", "hannah"));
        assert!(all.has_edge("hannah", "anna"));
        assert!(all.is_symmetric());
    }

    #[test]
    fn test_augment_invalid_line() {
        let mut graph = table("\"ann\",\"\"\n");
        let report = augment(
            &mut graph,
            &SimpleNormalizer::default(),
            NameType::Given,
            ["ann: mary-ann"],
            AugmentOptions::default(),
        );
        assert_eq!(report.invalid_lines, 1);
        assert_eq!(graph.degree("ann"), 0);
    }

    fn star_graph() -> SimilarNameGraph {
        let mut graph = SimilarNameGraph::new();
        for other in ["jon", "jhon", "joan", "johann", "jonathan"] {
            graph.insert_edge("john", other);
            graph.insert_edge(other, "john");
        }
        graph.insert_edge("jon", "joan");
        graph.insert_edge("joan", "jon");
        graph
    }

    #[test]
    fn test_prune_bounds_degree() {
        let mut graph = star_graph();
        let report = prune(&mut graph, &scorer(), 2);
        for name in graph.nodes() {
            assert!(graph.degree(name) <= 2, "{name}");
        }
        assert!(graph.is_symmetric());
        assert_eq!(report.missing_reverse, 0);
        // lev 1: jon, joan; lev 2: jhon, johann; jonathan further
        let kept: Vec<_> = graph.neighbors("john").unwrap().iter().cloned().collect();
        assert_eq!(kept, ["joan", "jon"]);
        assert_eq!(report.edges_removed, 3);
    }

    #[test]
    fn test_prune_ties_drop_later_names() {
        let mut graph = SimilarNameGraph::new();
        for other in ["abc", "abd", "abe"] {
            graph.insert_edge("abx", other);
            graph.insert_edge(other, "abx");
        }
        prune(&mut graph, &scorer(), 1);
        let kept: Vec<_> = graph.neighbors("abx").unwrap().iter().cloned().collect();
        assert_eq!(kept, ["abc"]);
    }

    #[test]
    fn test_prune_reports_missing_reverse() {
        let mut graph = SimilarNameGraph::new();
        graph.insert_edge("ann", "anne");
        graph.insert_edge("ann", "annie");
        graph.add_node("anne");
        let report = prune(&mut graph, &scorer(), 0);
        assert_eq!(report.missing_reverse, 2);
        assert_eq!(graph.degree("ann"), 0);
    }

    #[test]
    fn test_pairwise_table() {
        let names: Vec<String> = ["ann", "anne", "anna", "bob"].iter().map(|s| s.to_string()).collect();
        let graph = pairwise_table(&scorer(), &names, -1.0, 0, None);
        assert_eq!(graph.len(), 4);
        let ann: Vec<_> = graph.neighbors("ann").unwrap().iter().cloned().collect();
        assert_eq!(ann, ["anna", "anne"]);
        // only the name < other half
        assert_eq!(graph.degree("anne"), 0);
        let anna: Vec<_> = graph.neighbors("anna").unwrap().iter().cloned().collect();
        assert_eq!(anna, ["anne"]);

        let part = pairwise_table(&scorer(), &names, -1.0, 1, Some(2));
        let rows: Vec<_> = part.nodes().collect();
        assert_eq!(rows, ["anne", "anna"]);
        assert!(pairwise_table(&scorer(), &names, -1.0, 9, Some(2)).is_empty());
    }
}
