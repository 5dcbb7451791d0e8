use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use exprcalls::ontology::{ConditionGraph, HierarchyBuilder, Relation};
use exprcalls::propagation::{Propagator, Scope};
use exprcalls::source::InMemoryCallSource;
use exprcalls::{
    AnatEntityId, CallType, Condition, DataState, DataType, EngineConfig, Evidence, GeneCondition,
    Presence, StageId,
};

const SPECIES: u32 = 7955;
const STAGES: [&str; 3] = ["embryo", "larva", "adult"];

/// A binary tree of anatomical entities, `depth` levels deep
fn ontology(depth: u32) -> ConditionGraph {
    let n_terms = 2usize.pow(depth) - 1;
    let name = |i: usize| format!("Anat_{i}");

    let mut anatomy = HierarchyBuilder::<AnatEntityId>::new();
    for i in 0..n_terms {
        anatomy.add_term(name(i));
    }
    let mut anatomy = anatomy.terms_complete();
    for i in 1..n_terms {
        let relation = if i % 2 == 0 {
            Relation::IsA
        } else {
            Relation::PartOf
        };
        anatomy.add_parent(name(i), name((i - 1) / 2), relation).unwrap();
    }

    let mut stages = HierarchyBuilder::<StageId>::new();
    stages.add_term("life");
    for stage in STAGES {
        stages.add_term(stage);
    }
    let mut stages = stages.terms_complete();
    for stage in STAGES {
        stages.add_parent(stage, "life", Relation::PartOf).unwrap();
    }

    let mut conditions = Vec::new();
    for i in 0..n_terms {
        conditions.push(Condition::new(name(i), "life", SPECIES));
        for stage in STAGES {
            conditions.push(Condition::new(name(i), stage, SPECIES));
        }
    }

    ConditionGraph::new(anatomy.build().unwrap(), stages.build().unwrap(), conditions).unwrap()
}

fn source(ontology: &ConditionGraph, n_genes: usize) -> InMemoryCallSource {
    let mut records = Vec::new();
    for (idx, condition) in ontology.conditions().enumerate() {
        for gene in 0..n_genes {
            let key = GeneCondition::new(format!("GENE_{gene}"), condition.clone());
            match (idx + gene) % 7 {
                0 => records.push(Evidence::new(
                    key,
                    DataType::RnaSeq,
                    CallType::Expression,
                    DataState::HighQuality,
                    Some((idx % 100) as f64 + 1.0),
                    2,
                )),
                1 => records.push(Evidence::new(
                    key,
                    DataType::Affymetrix,
                    CallType::Expression,
                    DataState::LowQuality,
                    Some((gene % 50) as f64 + 1.0),
                    1,
                )),
                3 => records.push(Evidence::new(
                    key,
                    DataType::InSitu,
                    CallType::NoExpression,
                    DataState::HighQuality,
                    None,
                    1,
                )),
                _ => {}
            }
        }
    }
    InMemoryCallSource::from_evidence(&records, &EngineConfig::default()).unwrap()
}

fn single_calls(c: &mut Criterion) {
    let ontology = ontology(8);
    let source = source(&ontology, 20);
    let propagator = Propagator::new(&ontology, &source);
    let root = Condition::new("Anat_0", "life", SPECIES);
    let gene = "GENE_3".into();

    c.bench_function("propagate presence to root", |b| {
        b.iter(|| {
            propagator
                .propagate::<Presence>(black_box(&gene), black_box(&root), Scope::Propagated)
                .unwrap()
        })
    });
}

fn batch(c: &mut Criterion) {
    let ontology = ontology(7);
    let source = source(&ontology, 20);
    let propagator = Propagator::new(&ontology, &source);
    let requests: Vec<GeneCondition> = ontology
        .conditions()
        .flat_map(|condition| {
            (0..20).map(move |gene| GeneCondition::new(format!("GENE_{gene}"), condition.clone()))
        })
        .collect();

    let mut group = c.benchmark_group("resolve batch");
    group.sample_size(10);
    for scope in [Scope::SelfOnly, Scope::Propagated] {
        group.bench_function(format!("{scope:?}"), |b| {
            b.iter(|| {
                propagator
                    .resolve_batch(black_box(&requests), scope, &AtomicBool::new(false))
                    .unwrap()
                    .len()
            })
        });
    }
    group.finish();
}

criterion_group!(propagation, single_calls, batch);
criterion_main!(propagation);
