use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::QuizError;
use crate::quiz::{Country, Round, OPTIONS_PER_ROUND};

/// Builds a round out of `countries`.
///
/// The candidate is drawn uniformly, the other options come from a random permutation of
/// the pool, skipping anything whose flag is already on offer. Some datasets carry the same
/// flag image under different names, so the flag is what has to be unique, not the name.
pub fn start_round<R: Rng + ?Sized>(countries: &[Country], rng: &mut R) -> Result<Round, QuizError> {
    let candidate = countries
        .choose(rng)
        .ok_or(QuizError::InsufficientOptions {
            distinct: 0,
            required: OPTIONS_PER_ROUND,
        })?;

    let mut pool: Vec<&Country> = countries.iter().collect();
    pool.shuffle(rng);

    let mut offered = vec![candidate.clone()];
    for country in pool {
        if offered.len() == OPTIONS_PER_ROUND {
            break;
        }
        if offered.iter().any(|c| c.flag_url == country.flag_url) {
            continue;
        }
        offered.push(country.clone());
    }

    if offered.len() < OPTIONS_PER_ROUND {
        return Err(QuizError::InsufficientOptions {
            distinct: offered.len(),
            required: OPTIONS_PER_ROUND,
        });
    }

    // The candidate went in first
    offered.shuffle(rng);

    log::debug!(
        "New round: {} among {:?}",
        candidate.name,
        offered.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
    );

    Ok(Round::new(candidate.clone(), offered))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::quiz::test_support::pool;

    fn assert_well_formed(round: &Round) {
        assert_eq!(round.offered().len(), OPTIONS_PER_ROUND);
        let flags: HashSet<_> = round.offered().iter().map(|c| &c.flag_url).collect();
        assert_eq!(flags.len(), OPTIONS_PER_ROUND);
        let candidate_count = round
            .offered()
            .iter()
            .filter(|c| *c == round.candidate())
            .count();
        assert_eq!(candidate_count, 1);
    }

    #[test]
    fn rounds_offer_four_distinct_flags_including_the_candidate() {
        let countries = pool(&["France", "Italy", "Japan", "Chile", "Peru", "Kenya", "Nepal"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let round = start_round(&countries, &mut rng).unwrap();
            assert_well_formed(&round);
        }
    }

    #[test]
    fn four_countries_are_all_offered() {
        let countries = pool(&["A", "B", "C", "D"]);
        let mut rng = StdRng::seed_from_u64(1);
        let round = start_round(&countries, &mut rng).unwrap();

        let mut names: Vec<_> = round.offered().iter().map(|c| c.name.clone()).collect();
        names.sort();
        assert_eq!(names, ["A", "B", "C", "D"]);
    }

    #[test]
    fn shared_flags_are_never_offered_together() {
        let mut countries = pool(&["Norway", "Chad", "Peru", "Laos"]);
        let norway_flag = countries[0].flag_url.clone();
        let chad_flag = countries[1].flag_url.clone();
        // Same image listed twice under different names
        countries.push(Country::new(10, "Svalbard", norway_flag));
        countries.push(Country::new(11, "Romania", chad_flag));

        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            assert_well_formed(&start_round(&countries, &mut rng).unwrap());
        }
    }

    #[test]
    fn three_countries_are_not_enough() {
        let countries = pool(&["A", "B", "C"]);
        let mut rng = StdRng::seed_from_u64(3);
        let err = start_round(&countries, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            QuizError::InsufficientOptions {
                distinct: 3,
                required: 4
            }
        ));
    }

    #[test]
    fn duplicated_flags_do_not_count_towards_the_minimum() {
        let countries: Vec<_> = (0..6)
            .map(|i| Country::new(i, format!("Country {i}"), format!("flag-{}", i % 3)))
            .collect();
        let mut rng = StdRng::seed_from_u64(9);
        assert!(matches!(
            start_round(&countries, &mut rng),
            Err(QuizError::InsufficientOptions { distinct: 3, .. })
        ));
    }

    #[test]
    fn empty_pool_is_rejected() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            start_round(&[], &mut rng),
            Err(QuizError::InsufficientOptions { distinct: 0, .. })
        ));
    }

    #[test]
    fn same_seed_same_round() {
        let countries = pool(&["France", "Italy", "Japan", "Chile", "Peru", "Kenya"]);
        let first = start_round(&countries, &mut StdRng::seed_from_u64(2024)).unwrap();
        let second = start_round(&countries, &mut StdRng::seed_from_u64(2024)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn candidate_is_not_always_first() {
        let countries = pool(&["France", "Italy", "Japan", "Chile", "Peru", "Kenya"]);
        let mut rng = StdRng::seed_from_u64(5);
        let positions: HashSet<_> = (0..100)
            .map(|_| {
                let round = start_round(&countries, &mut rng).unwrap();
                round
                    .offered()
                    .iter()
                    .position(|c| c == round.candidate())
                    .unwrap()
            })
            .collect();
        assert!(positions.len() > 1);
    }
}
