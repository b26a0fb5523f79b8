use std::collections::HashSet;

use log::info;

use chronika_core::VersionRecord;

/// Collapses candidates whose computed `(start, end)` pair collides exactly;
/// an open end is its own bucket. The first occurrence wins, and when
/// anything is discarded the survivors are renumbered to a contiguous
/// `2..=M` run. Ordinal 1 is never part of the candidate list.
pub fn dedup_candidates(candidates: Vec<VersionRecord>) -> (Vec<VersionRecord>, usize) {
    let mut seen: HashSet<(i64, Option<i64>)> = HashSet::with_capacity(candidates.len());
    let before = candidates.len();
    let mut survivors: Vec<VersionRecord> = candidates
        .into_iter()
        .filter(|candidate| {
            seen.insert((
                candidate.valid_from.as_micros(),
                candidate.valid_to.map(|end| end.as_micros()),
            ))
        })
        .collect();
    let discarded = before - survivors.len();
    if discarded > 0 {
        info!("dedup: discarded {discarded} colliding versions, renumbering survivors");
        for (index, survivor) in survivors.iter_mut().enumerate() {
            survivor.ordinal = (index + 2) as u32;
        }
    }
    (survivors, discarded)
}
