//! Similar-name candidate generation.
//!
//! With clusters, the query is scored against every representative and only
//! clusters close enough are searched member by member. When none is close
//! enough, the single closest cluster is searched anyway. Without clusters
//! every known name is scored.

use ahash::AHashMap;
use rayon::prelude::*;
use tracing::debug;

use crate::cluster::ClusterSet;
use crate::config::GeneratorConfig;
use crate::features::Codes;
use crate::scorer::Scorer;
use crate::types::NameScore;

struct IndexedName {
    name: String,
    codes: Codes,
}

struct IndexedCluster {
    representative: IndexedName,
    members: Vec<IndexedName>,
}

enum CandidateIndex {
    Clustered(Vec<IndexedCluster>),
    Flat(Vec<IndexedName>),
}

pub struct SimilarNameGenerator {
    scorer: Scorer,
    index: CandidateIndex,
    config: GeneratorConfig,
}

fn index_names<'a>(scorer: &Scorer, names: impl IntoParallelIterator<Item = &'a str>) -> Vec<IndexedName> {
    names
        .into_par_iter()
        .map(|name| IndexedName {
            name: name.to_string(),
            codes: scorer.codes(name),
        })
        .collect()
}

/// Best score per candidate name.
#[derive(Default)]
struct Candidates<'a> {
    scores: AHashMap<&'a str, f64>,
}

impl<'a> Candidates<'a> {
    fn offer(&mut self, name: &'a str, score: f64, threshold: f64) {
        if score >= threshold {
            let best = self.scores.entry(name).or_insert(score);
            if score > *best {
                *best = score;
            }
        }
    }

    fn into_sorted(self, max_names: Option<usize>) -> Vec<NameScore> {
        let mut result: Vec<NameScore> = self
            .scores
            .into_iter()
            .map(|(name, score)| NameScore::new(name, score))
            .collect();
        result.sort();
        if let Some(max) = max_names {
            result.truncate(max);
        }
        result
    }
}

impl SimilarNameGenerator {
    /// Index the clusters, or flatten them into one name list when
    /// `config.use_clusters` is off.
    pub fn new(scorer: Scorer, clusters: &ClusterSet, config: GeneratorConfig) -> Self {
        let index = if config.use_clusters {
            let indexed = clusters
                .as_slice()
                .par_iter()
                .map(|cluster| IndexedCluster {
                    representative: IndexedName {
                        name: cluster.representative.clone(),
                        codes: scorer.codes(&cluster.representative),
                    },
                    members: cluster
                        .members
                        .iter()
                        .map(|name| IndexedName {
                            name: name.clone(),
                            codes: scorer.codes(name),
                        })
                        .collect(),
                })
                .collect();
            CandidateIndex::Clustered(indexed)
        } else {
            let names: Vec<&str> = clusters.names().collect();
            CandidateIndex::Flat(index_names(&scorer, names))
        };
        Self {
            scorer,
            index,
            config,
        }
    }

    /// Exhaustive generator over a flat vocabulary.
    pub fn flat<'a>(scorer: Scorer, names: impl IntoIterator<Item = &'a str>, config: GeneratorConfig) -> Self {
        let names: Vec<&str> = names.into_iter().collect();
        let index = CandidateIndex::Flat(index_names(&scorer, names));
        Self {
            scorer,
            index,
            config: GeneratorConfig {
                use_clusters: false,
                ..config
            },
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Scored candidates with the configured thresholds.
    pub fn generate(&self, name: &str) -> Vec<NameScore> {
        self.generate_with(name, &self.config)
    }

    /// Scored candidates, best first, ties by name.
    pub fn generate_with(&self, name: &str, config: &GeneratorConfig) -> Vec<NameScore> {
        let codes = self.scorer.codes(name);
        let mut candidates = Candidates::default();
        let threshold = config.classifier_threshold;

        match &self.index {
            CandidateIndex::Clustered(clusters) => {
                let mut closest: Option<(&IndexedCluster, f64)> = None;
                let mut searched = 0;
                for cluster in clusters {
                    let rep = &cluster.representative;
                    let score = self.scorer.score_codes(name, &codes, &rep.name, &rep.codes);
                    if score > closest.map_or(f64::NEG_INFINITY, |(_, best)| best) {
                        closest = Some((cluster, score));
                    }
                    if score >= config.cluster_threshold {
                        self.search_cluster(name, &codes, cluster, score, threshold, &mut candidates);
                        searched += 1;
                    }
                }
                if let Some((cluster, score)) = closest {
                    if score < config.cluster_threshold {
                        self.search_cluster(name, &codes, cluster, score, threshold, &mut candidates);
                        searched += 1;
                    }
                }
                debug!(name, searched, clusters = clusters.len(), "searched clusters");
            }
            CandidateIndex::Flat(names) => {
                for other in names {
                    if other.name != name {
                        let score = self.scorer.score_codes(name, &codes, &other.name, &other.codes);
                        candidates.offer(&other.name, score, threshold);
                    }
                }
            }
        }

        candidates.into_sorted(config.max_names)
    }

    fn search_cluster<'a>(
        &self,
        name: &str,
        codes: &Codes,
        cluster: &'a IndexedCluster,
        representative_score: f64,
        threshold: f64,
        candidates: &mut Candidates<'a>,
    ) {
        if cluster.representative.name != name {
            candidates.offer(&cluster.representative.name, representative_score, threshold);
        }
        for member in &cluster.members {
            if member.name != name {
                let score = self.scorer.score_codes(name, codes, &member.name, &member.codes);
                candidates.offer(&member.name, score, threshold);
            }
        }
    }

    /// Candidate names only, best first.
    pub fn similar_names(&self, name: &str) -> Vec<String> {
        self.generate(name).into_iter().map(|s| s.name).collect()
    }
}
