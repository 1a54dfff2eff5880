use std::sync::Arc;

use proptest::prelude::*;

use namesim_core::maintenance::prune;
use namesim_core::phoneme::NUM_PHONEMES;
use namesim_core::*;

const POOL: &[&str] = &[
    "ann", "anne", "annie", "anna", "hannah", "carl", "karl", "carla", "jon", "john", "joan", "johann",
];

fn scorer() -> Scorer {
    let features = FeaturesGenerator::new(
        NameType::Given,
        PhonemeTokenizer::new(Arc::new(LetterRules)),
        WeightedEditDistance::new(Arc::new(CostMatrix::uniform(2, 10, 8)), 1.0),
        DmSoundex::default(),
    );
    Scorer::new(
        features,
        Arc::new(|f: &FeatureVector| f.soundex_match - f.edit_cost - f.levenshtein),
    )
}

fn symmetric_graph(edges: &[(usize, usize)]) -> SimilarNameGraph {
    let mut graph = SimilarNameGraph::new();
    for name in POOL {
        graph.add_node(name);
    }
    for &(a, b) in edges {
        if a != b {
            graph.insert_edge(POOL[a], POOL[b]);
            graph.insert_edge(POOL[b], POOL[a]);
        }
    }
    graph
}

fn phonemes() -> impl Strategy<Value = PhonemeSequence> {
    prop::collection::vec(0..NUM_PHONEMES, 0..10).prop_map(|ids| {
        PhonemeSequence::new(ids.into_iter().filter_map(Phoneme::from_id).collect())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prune_bounds_degree_and_keeps_symmetry(
        edges in prop::collection::vec((0..POOL.len(), 0..POOL.len()), 0..40),
        max_edges in 0usize..5,
    ) {
        let mut graph = symmetric_graph(&edges);
        let before = graph.edge_count();
        let report = prune(&mut graph, &scorer(), max_edges);

        for name in graph.nodes() {
            prop_assert!(graph.degree(name) <= max_edges, "{} has {} edges", name, graph.degree(name));
        }
        prop_assert!(graph.is_symmetric());
        prop_assert_eq!(report.missing_reverse, 0);
        prop_assert_eq!(graph.len(), POOL.len());
        // each dropped edge also takes its reverse
        prop_assert_eq!(before - graph.edge_count(), 2 * report.edges_removed);
    }

    #[test]
    fn prune_keeps_graphs_already_within_bound(
        edges in prop::collection::vec((0..POOL.len(), 0..POOL.len()), 0..40),
    ) {
        let mut graph = symmetric_graph(&edges);
        let expected = graph.clone();
        let report = prune(&mut graph, &scorer(), POOL.len());
        prop_assert_eq!(report.edges_removed, 0);
        prop_assert_eq!(graph, expected);
    }

    #[test]
    fn symmetric_score_ignores_order(
        a in phonemes(),
        b in phonemes(),
        matched in 0u32..20,
        substitute in 0u32..=MAX_EDIT_COST,
        indel in 0u32..=MAX_EDIT_COST,
    ) {
        let distance = WeightedEditDistance::new(Arc::new(CostMatrix::uniform(matched, substitute, indel)), 1.0);
        let forward = distance.symmetric_score(&a, &b);
        prop_assert_eq!(forward, distance.symmetric_score(&b, &a));
        prop_assert!(forward <= distance.score(&a, &b));
        prop_assert!(forward <= distance.score(&b, &a));
    }
}
