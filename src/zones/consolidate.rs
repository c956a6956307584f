// =============================================================================
// Zone Consolidation
// =============================================================================
//
// Candidates are folded in detection order.  Each one is compared against the
// accepted zones from the most recently accepted backwards; the first
// same-type zone whose band overlaps it decides the outcome:
//
//   candidate stronger  -> candidate replaces that zone in place
//   otherwise           -> candidate is dropped
//
// A candidate with no conflict is appended.  The result keeps the last
// MAX_ZONES entries.  Linear scan: fine at tens of zones.
// =============================================================================

use super::Zone;

/// Upper bound on zones returned from one detection pass.
pub const MAX_ZONES: usize = 20;

pub fn consolidate(candidates: impl IntoIterator<Item = Zone>) -> Vec<Zone> {
    let mut accepted: Vec<Zone> = Vec::new();

    for candidate in candidates {
        let conflict = accepted.iter().rposition(|zone| {
            zone.zone_type == candidate.zone_type && zone.overlaps(candidate.low, candidate.high)
        });

        match conflict {
            Some(j) => {
                if candidate.strength > accepted[j].strength {
                    accepted[j] = candidate;
                }
            }
            None => accepted.push(candidate),
        }
    }

    if accepted.len() > MAX_ZONES {
        let excess = accepted.len() - MAX_ZONES;
        accepted.drain(..excess);
    }

    accepted
}
