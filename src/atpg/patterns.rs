use crate::atpg::TestVector;
use crate::sim::{detection_table, Fault};
use crate::{Network, NetworkError};

/// Compress a set of test vectors to keep as few as possible, without losing coverage
///
/// This is a minimum set cover problem.
/// At the moment we solve it with a simple greedy algorithm,
/// taking the vector that detects the most new faults each time.
/// The vectors kept are returned in selection order.
pub fn compact_patterns(
    aig: &Network,
    faults: &[Fault],
    patterns: &[TestVector],
) -> Result<Vec<TestVector>, NetworkError> {
    let bits: Vec<Vec<bool>> = patterns.iter().map(|p| p.bits().to_vec()).collect();

    // Which faults are detected by a given pattern
    let pattern_to_faults = detection_table(aig, faults, &bits)?;

    // Which patterns detect a given fault
    let mut fault_to_patterns = vec![Vec::new(); faults.len()];
    for (p, detected) in pattern_to_faults.iter().enumerate() {
        for f in detected {
            fault_to_patterns[*f].push(p);
        }
    }
    let mut remaining_to_detect = fault_to_patterns.iter().filter(|v| !v.is_empty()).count();

    // How many new faults each pattern detects
    let mut nb_detected_by_pattern: Vec<usize> =
        pattern_to_faults.iter().map(|v| v.len()).collect();

    let mut selected_patterns = Vec::new();
    while remaining_to_detect > 0 {
        // Pick the pattern that detects the most faults, the first one in case of a tie
        let Some(best_pattern) = (0..patterns.len())
            .rev()
            .max_by_key(|p| nb_detected_by_pattern[*p])
        else {
            break;
        };
        if nb_detected_by_pattern[best_pattern] == 0 {
            break;
        }
        selected_patterns.push(best_pattern);
        remaining_to_detect -= nb_detected_by_pattern[best_pattern];

        // Remove the faults detected by the pattern from consideration
        for f in &pattern_to_faults[best_pattern] {
            for p in &fault_to_patterns[*f] {
                nb_detected_by_pattern[*p] -= 1;
            }
            // So we don't remove a fault twice
            fault_to_patterns[*f].clear();
        }
        debug_assert_eq!(nb_detected_by_pattern[best_pattern], 0);
    }

    Ok(selected_patterns
        .into_iter()
        .map(|p| patterns[p].clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::compact_patterns;
    use crate::atpg::TestVector;
    use crate::network::generators::testcases;
    use crate::sim::{fault_coverage, Fault};

    #[test]
    fn test_compact_and() {
        let aig = testcases::and2().unwrap();
        let faults = Fault::all(&aig);
        let patterns: Vec<TestVector> = [[false, true], [true, true], [true, false], [true, true]]
            .iter()
            .map(|p| TestVector::new(p.to_vec()))
            .collect();
        let kept = compact_patterns(&aig, &faults, &patterns).unwrap();
        // 11 detects a/0, b/0 and f/0; 01 and 10 are both needed for a/1 and b/1
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0], TestVector::new(vec![true, true]));

        let bits = |v: &[TestVector]| -> Vec<Vec<bool>> {
            v.iter().map(|p| p.bits().to_vec()).collect()
        };
        assert_eq!(
            fault_coverage(&aig, &faults, &bits(&kept)).unwrap(),
            fault_coverage(&aig, &faults, &bits(&patterns)).unwrap()
        );
    }

    #[test]
    fn test_compact_empty() {
        let aig = testcases::and2().unwrap();
        let faults = Fault::all(&aig);
        assert!(compact_patterns(&aig, &faults, &[]).unwrap().is_empty());
        // A pattern detecting nothing new is dropped
        let patterns = vec![
            TestVector::new(vec![true, true]),
            TestVector::new(vec![true, true]),
        ];
        assert_eq!(compact_patterns(&aig, &faults, &patterns).unwrap().len(), 1);
    }
}
