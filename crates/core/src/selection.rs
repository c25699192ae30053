//! Registrant selection (sortition) for an assembly.
//!
//! A run draws `target` registrants from the eligible pool using a seeded
//! shuffle. The pool is sorted by id before shuffling, so the same pool and
//! seed always produce the same selection and a run can be audited by
//! replaying it.
//!
//! With stratification, the pool is split by the value of one demographic
//! attribute and each value's quota is drawn from its own sub-pool.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// A registrant eligible for selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: DbId,
    pub attributes: BTreeMap<String, String>,
}

/// Quotas for one demographic attribute, keyed by attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stratification {
    pub attribute: String,
    pub quotas: BTreeMap<String, u32>,
}

/// Parameters of a selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    pub target: u32,
    pub stratification: Option<Stratification>,
}

/// The registrants chosen by a run, in rank order (rank 1 first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    pub selected: Vec<DbId>,
    pub pool_size: usize,
}

/// Generate a fresh non-negative seed that fits in a BIGINT column.
pub fn generate_seed() -> i64 {
    rand::rng().random_range(0..i64::MAX)
}

/// Validate a request before touching the pool.
pub fn validate_request(request: &SelectionRequest) -> Result<(), CoreError> {
    if request.target == 0 {
        return Err(CoreError::Validation(
            "Selection target must be greater than zero".to_string(),
        ));
    }
    if let Some(strat) = &request.stratification {
        if strat.attribute.trim().is_empty() {
            return Err(CoreError::Validation(
                "Stratification attribute must not be blank".to_string(),
            ));
        }
        if strat.quotas.is_empty() {
            return Err(CoreError::Validation(
                "Stratification needs at least one quota".to_string(),
            ));
        }
        let total: u64 = strat.quotas.values().map(|q| u64::from(*q)).sum();
        if total != u64::from(request.target) {
            return Err(CoreError::Validation(format!(
                "Stratification quotas sum to {total} but the target is {}",
                request.target
            )));
        }
    }
    Ok(())
}

/// Draw registrants from `pool`.
///
/// The pool's input order does not matter. Fails with a validation error
/// when the pool (or a stratum) holds fewer candidates than requested.
pub fn select(
    pool: &[Candidate],
    request: &SelectionRequest,
    seed: i64,
) -> Result<SelectionOutcome, CoreError> {
    validate_request(request)?;

    let mut sorted: Vec<&Candidate> = pool.iter().collect();
    sorted.sort_by_key(|c| c.id);
    sorted.dedup_by_key(|c| c.id);

    let target = request.target as usize;
    if sorted.len() < target {
        return Err(CoreError::Validation(format!(
            "Pool has {} eligible registrants but {target} were requested",
            sorted.len()
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed as u64);

    let selected = match &request.stratification {
        None => {
            let mut ids: Vec<DbId> = sorted.iter().map(|c| c.id).collect();
            ids.shuffle(&mut rng);
            ids.truncate(target);
            ids
        }
        Some(strat) => {
            let mut selected = Vec::with_capacity(target);
            for (value, quota) in &strat.quotas {
                let mut stratum: Vec<DbId> = sorted
                    .iter()
                    .filter(|c| c.attributes.get(&strat.attribute) == Some(value))
                    .map(|c| c.id)
                    .collect();
                let quota = *quota as usize;
                if stratum.len() < quota {
                    return Err(CoreError::Validation(format!(
                        "Stratum {}='{value}' has {} eligible registrants but needs {quota}",
                        strat.attribute,
                        stratum.len()
                    )));
                }
                stratum.shuffle(&mut rng);
                selected.extend(stratum.into_iter().take(quota));
            }
            selected
        }
    };

    Ok(SelectionOutcome {
        selected,
        pool_size: sorted.len(),
    })
}
