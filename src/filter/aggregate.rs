use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

use tracing::debug;

use crate::filter::MergeableFilter;

/// Merges the filters of many entities into as few distinct filters as possible
///
/// Every `(filter, entity)` pair is put into a work queue. The head of the
/// queue is then compared with every other pair that was in the queue when its
/// round started. If both filters can be merged (with
/// [`MergeableFilter::merge_same_entity`] if the pair's entity is already
/// covered by the head filter, with [`MergeableFilter::merge_different_entities`]
/// otherwise), the merged filter replaces the head filter and the pair is
/// removed from the queue. Pairs that cannot be merged go back to the end of
/// the queue, to be handled in a later round.
///
/// This is a single greedy pass, the result is not guaranteed to be minimal.
/// Every entity of the input is part of the output, and the filter it is
/// grouped under retrieves everything its input filters retrieve.
///
/// # Examples
///
/// ```
/// use std::collections::{HashMap, HashSet};
/// use exprcalls::filter::{aggregate, CallFilter};
///
/// let mut input = HashMap::new();
/// let liver_genes = [CallFilter::for_gene("ID1"), CallFilter::for_gene("ID2")];
/// input.insert("liver", HashSet::from(liver_genes));
/// input.insert("brain", HashSet::from([CallFilter::for_gene("ID1")]));
///
/// let output = aggregate(input);
///
/// let entities: HashSet<&str> = output.values().flatten().copied().collect();
/// assert_eq!(entities, HashSet::from(["liver", "brain"]));
/// assert!(output.len() <= 2);
/// ```
pub fn aggregate<F, E>(entities_with_filters: HashMap<E, HashSet<F>>) -> HashMap<F, HashSet<E>>
where
    F: MergeableFilter + Clone + Eq + Hash,
    E: Clone + Eq + Hash,
{
    let mut queue: VecDeque<(F, E)> = entities_with_filters
        .into_iter()
        .flat_map(|(entity, filters)| {
            filters
                .into_iter()
                .map(move |filter| (filter, entity.clone()))
        })
        .collect();
    let n_input = queue.len();

    let mut res: HashMap<F, HashSet<E>> = HashMap::new();
    let mut rounds = 0usize;
    let mut comparisons = 0usize;

    while let Some((mut filter, entity)) = queue.pop_front() {
        rounds += 1;
        let mut entities = HashSet::from([entity]);

        // pairs that are re-enqueued during this round are not compared again
        let round_size = queue.len();
        for _ in 0..round_size {
            let Some((other, other_entity)) = queue.pop_front() else {
                break;
            };
            comparisons += 1;
            let merged = if entities.contains(&other_entity) {
                filter.merge_same_entity(&other)
            } else {
                filter.merge_different_entities(&other)
            };
            match merged {
                Some(merged) => {
                    filter = merged;
                    entities.insert(other_entity);
                }
                None => queue.push_back((other, other_entity)),
            }
        }

        res.entry(filter).or_default().extend(entities);
    }

    debug!(
        "Aggregated {} filters into {} in {} rounds ({} comparisons)",
        n_input,
        res.len(),
        rounds,
        comparisons
    );
    res
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::condition::GeneId;
    use crate::data::{CallType, DataState, DataType};
    use crate::filter::{CallFilter, StateRequirement};

    fn rna_high(genes: &[&str]) -> CallFilter {
        let genes: Vec<GeneId> = genes.iter().map(|g| GeneId::from(*g)).collect();
        CallFilter::new(
            &genes,
            &[StateRequirement::new(
                CallType::Expression,
                &[DataType::RnaSeq],
                DataState::HighQuality,
            )],
        )
    }

    fn absent(genes: &[&str]) -> CallFilter {
        let genes: Vec<GeneId> = genes.iter().map(|g| GeneId::from(*g)).collect();
        CallFilter::new(
            &genes,
            &[StateRequirement::new(
                CallType::NoExpression,
                &[],
                DataState::LowQuality,
            )],
        )
    }

    /// Every input entity is in the output and every input filter
    /// is subsumed by the filter the entity is grouped under
    fn assert_correct(
        input: &HashMap<&'static str, HashSet<CallFilter>>,
        output: &HashMap<CallFilter, HashSet<&'static str>>,
    ) {
        let out_entities: HashSet<&str> = output.values().flatten().copied().collect();
        let in_entities: HashSet<&str> = input.keys().copied().collect();
        assert_eq!(in_entities, out_entities);

        for (entity, filters) in input {
            for requested in filters {
                assert!(
                    output
                        .iter()
                        .any(|(f, entities)| entities.contains(entity) && f.subsumes(requested)),
                    "{entity}: {requested:?} is not covered"
                );
            }
        }
    }

    #[test]
    fn empty_input() {
        let output: HashMap<CallFilter, HashSet<&str>> = aggregate(HashMap::new());
        assert!(output.is_empty());
    }

    #[test]
    fn same_entity_filters_are_combined() {
        let input = HashMap::from([(
            "liver",
            HashSet::from([rna_high(&["ID1"]), rna_high(&["ID2"]), rna_high(&["ID3"])]),
        )]);
        let output = aggregate(input.clone());

        assert_eq!(output.len(), 1);
        let (filter, entities) = output.iter().next().unwrap();
        assert_eq!(filter.genes().len(), 3);
        assert_eq!(entities.len(), 1);
        assert_correct(&input, &output);
    }

    #[test]
    fn identical_filters_of_different_entities_are_grouped() {
        let input = HashMap::from([
            ("liver", HashSet::from([rna_high(&["ID1"])])),
            ("brain", HashSet::from([rna_high(&["ID1"])])),
            ("heart", HashSet::from([rna_high(&["ID1"])])),
        ]);
        let output = aggregate(input.clone());

        assert_eq!(output.len(), 1);
        assert_eq!(output[&rna_high(&["ID1"])].len(), 3);
        assert_correct(&input, &output);
    }

    #[test]
    fn unmergeable_filters_stay_apart() {
        let input = HashMap::from([
            ("liver", HashSet::from([rna_high(&["ID1"])])),
            ("brain", HashSet::from([absent(&["ID2"])])),
        ]);
        let output = aggregate(input.clone());

        assert_eq!(output.len(), 2);
        assert_correct(&input, &output);
    }

    #[test]
    fn mixed_input_is_covered() {
        let input = HashMap::from([
            (
                "liver",
                HashSet::from([rna_high(&["ID1"]), absent(&["ID1"]), rna_high(&["ID2"])]),
            ),
            ("brain", HashSet::from([rna_high(&["ID1"]), absent(&["ID3"])])),
            ("heart", HashSet::from([CallFilter::for_gene("ID1")])),
            ("lung", HashSet::from([absent(&["ID3"])])),
        ]);
        let n_filters: usize = input.values().map(HashSet::len).sum();
        let output = aggregate(input.clone());

        assert!(output.len() < n_filters);
        assert_correct(&input, &output);
    }
}
