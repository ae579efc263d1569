use indexmap::{IndexMap, IndexSet};

/// Most frequent non-blank value. Ties go to the value seen first.
pub fn majority_vote<'a, I>(values: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for value in values.into_iter().flatten() {
        if value.trim().is_empty() {
            continue;
        }
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut winner: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if winner.map_or(true, |(_, best)| count > best) {
            winner = Some((value, count));
        }
    }
    winner.map(|(value, _)| value.to_string())
}

/// Every non-blank entry across the lists, once each, in first-seen order.
pub fn union_first_seen<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen: IndexSet<&str> = IndexSet::new();
    for entry in lists.into_iter().flatten() {
        if !entry.trim().is_empty() {
            seen.insert(entry.as_str());
        }
    }
    seen.into_iter().map(str::to_string).collect()
}

/// Entries ordered by how often they occur, most frequent first, at most `limit` of them.
///
/// Entries with equal counts keep their first-seen order.
pub fn rank_by_frequency<'a, I>(lists: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for entry in lists.into_iter().flatten() {
        if !entry.trim().is_empty() {
            *counts.entry(entry.as_str()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    // Stable, so equal counts stay in insertion order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(entry, _)| entry.to_string())
        .collect()
}
