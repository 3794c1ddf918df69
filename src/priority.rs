//! Ordering of lots within a run.
//!
//! Classification is one round trip per lot, so curated lots go first: a run cut
//! short still has data for them.
use std::collections::BTreeSet;

use crate::status::LotId;

/// Orders `discovered` so every id in `high` precedes every other id. Within each
/// tier ids ascend numerically.
pub fn prioritize<'a, I>(discovered: I, high: &BTreeSet<LotId>) -> Vec<LotId>
where
    I: IntoIterator<Item = &'a LotId>,
{
    let (mut first, mut rest): (Vec<LotId>, Vec<LotId>) = discovered
        .into_iter()
        .cloned()
        .collect::<BTreeSet<LotId>>()
        .into_iter()
        .partition(|id| high.contains(id));
    first.sort_by(LotId::numeric_cmp);
    rest.sort_by(LotId::numeric_cmp);
    first.append(&mut rest);
    first
}
