//! Resolves the expression calls of a few genes in a small mouse anatomy
//!
//! Run with `RUST_LOG=debug cargo run --example propagate` to see the log output.
use std::sync::atomic::AtomicBool;

use exprcalls::ontology::{ConditionGraph, HierarchyBuilder, Relation};
use exprcalls::propagation::{Propagator, Scope};
use exprcalls::source::InMemoryCallSource;
use exprcalls::{
    AnatEntityId, CallResult, CallType, Condition, DataState, DataType, EngineConfig, Evidence,
    GeneCondition, SpeciesId, StageId,
};

/// gene, anatomical entity, stage, species, data type, call type, quality, rank
const EVIDENCE: &str = "\
ENSMUSG01\tforebrain\tadult\t10090\trna_seq\texpressed\thigh\t5.5
ENSMUSG01\tforebrain\tadult\t10090\taffymetrix\texpressed\tlow\t12
ENSMUSG01\thindbrain\tadult\t10090\tin_situ\tnot_expressed\thigh\t-
ENSMUSG02\tbrain\tadult\t10090\test\texpressed\tlow\t80
ENSMUSG02\tbrain\tadult\t10090\trna_seq\texpressed\tlow\t95
ENSMUSG03\tnervous_system\tadult\t10090\tin_situ\tnot_expressed\thigh\t-
ENSMUSG03\tcerebellum\tadult\t10090\trna_seq\texpressed\tlow\t150
";

fn anatomy() -> CallResult<HierarchyBuilder<AnatEntityId, exprcalls::ontology::AllTerms>> {
    let edges = [
        ("brain", "nervous_system", Relation::PartOf),
        ("forebrain", "brain", Relation::PartOf),
        ("hindbrain", "brain", Relation::PartOf),
        ("cerebellum", "hindbrain", Relation::PartOf),
        ("neural_tube", "nervous_system", Relation::IsA),
        ("brain", "neural_tube", Relation::DevelopsFrom),
    ];
    let mut anatomy = HierarchyBuilder::new();
    for (child, parent, _) in &edges {
        anatomy.add_term(*child);
        anatomy.add_term(*parent);
    }
    let mut anatomy = anatomy.terms_complete();
    for (child, parent, relation) in edges {
        anatomy.add_parent(child, parent, relation)?;
    }
    Ok(anatomy)
}

fn parse_evidence(line: &str) -> CallResult<Evidence> {
    let fields: Vec<&str> = line.split('\t').collect();
    let species = SpeciesId::try_from(fields[3])?;
    let call_type = if fields[5] == "expressed" {
        CallType::Expression
    } else {
        CallType::NoExpression
    };
    let state = if fields[6] == "high" {
        DataState::HighQuality
    } else {
        DataState::LowQuality
    };
    Ok(Evidence::new(
        GeneCondition::new(fields[0], Condition::new(fields[1], fields[2], species)),
        DataType::try_from(fields[4])?,
        call_type,
        state,
        fields[7].parse().ok(),
        1,
    ))
}

fn main() -> CallResult<()> {
    simple_logger::init_with_env().expect("the logger is only installed once");

    let anatomy = anatomy()?.build()?;
    let mut stages = HierarchyBuilder::<StageId>::new();
    stages.add_term("adult");
    let stages = stages.terms_complete().build()?;

    let mouse = SpeciesId::from(10090);
    let terms = [
        "nervous_system",
        "neural_tube",
        "brain",
        "forebrain",
        "hindbrain",
        "cerebellum",
    ];
    let conditions: Vec<Condition> = terms
        .iter()
        .map(|anat| Condition::new(*anat, "adult", mouse))
        .collect();
    let ontology = ConditionGraph::new(anatomy, stages, conditions.clone())?;

    let records = EVIDENCE
        .lines()
        .map(parse_evidence)
        .collect::<CallResult<Vec<Evidence>>>()?;
    let config = EngineConfig::default();
    let source = InMemoryCallSource::from_evidence(&records, &config)?;

    let requests: Vec<GeneCondition> = ["ENSMUSG01", "ENSMUSG02", "ENSMUSG03"]
        .iter()
        .flat_map(|gene| {
            conditions
                .iter()
                .map(move |condition| GeneCondition::new(*gene, condition.clone()))
        })
        .collect();

    let propagator = Propagator::new(&ontology, &source).with_config(config);
    for scope in [Scope::SelfOnly, Scope::Propagated] {
        println!("# {scope:?}");
        println!("gene\tanat_entity\tcall\tquality\torigin\tscore\tconflict");
        for call in propagator.resolve_batch(&requests, scope, &AtomicBool::new(false))? {
            let summary = call.summary();
            let origin = match (call.presence(), call.absence()) {
                (Some(presence), _) => presence.origin_of_line().to_string(),
                (None, Some(absence)) => absence.origin_of_line().to_string(),
                (None, None) => "-".to_string(),
            };
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                call.key().gene(),
                call.key().condition().anat_entity(),
                summary.call_type(),
                summary.quality(),
                origin,
                summary
                    .score()
                    .map_or_else(|| "-".to_string(), |score| format!("{score:.1}")),
                summary.has_conflict(),
            );
        }
    }
    Ok(())
}
