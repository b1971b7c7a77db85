//! Deduplication, ranking and paging of merged records.

use std::collections::HashSet;

use crate::adapter::ReleaseRecord;

/// Remove structurally identical records.
///
/// Identity is the canonical link (or guid when the link is empty) plus the
/// title. The first occurrence wins. Records with neither link nor guid
/// can't be identified and are all kept.
pub fn deduplicate(records: Vec<ReleaseRecord>) -> Vec<ReleaseRecord> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    records
        .into_iter()
        .filter(|r| {
            let link = if r.link.is_empty() {
                r.guid.as_deref().unwrap_or_default()
            } else {
                r.link.as_str()
            };
            if link.is_empty() {
                return true;
            }
            seen.insert((link.to_string(), r.title.clone()))
        })
        .collect()
}

/// Sort by gain, descending. Stable: equal gains keep their order.
/// NaN gains sort last; `-0.0` ties with `0.0`.
pub fn rank(records: &mut [ReleaseRecord]) {
    records.sort_by(|a, b| sort_key(b.gain).total_cmp(&sort_key(a.gain)));
}

fn sort_key(gain: f64) -> f64 {
    if gain.is_nan() {
        f64::NEG_INFINITY
    } else if gain == 0.0 {
        0.0
    } else {
        gain
    }
}

/// Skip `offset` records, then keep at most `limit` (0 or `None` = all).
pub fn paginate(
    records: Vec<ReleaseRecord>,
    offset: Option<u32>,
    limit: Option<u32>,
) -> Vec<ReleaseRecord> {
    let skipped = records.into_iter().skip(offset.unwrap_or(0) as usize);
    match limit {
        Some(limit) if limit > 0 => skipped.take(limit as usize).collect(),
        _ => skipped.collect(),
    }
}
