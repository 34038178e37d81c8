use crate::analyzers::types::{Bin, CountEntry};
use crate::analyzers::utility::pearson;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::hash::Hash;

/// Counts occurrences of each value.
///
/// Sorted by count, highest first; equal counts keep the order in which the
/// values first appeared, so the first entry is the mode.
pub fn value_counts<K, I>(values: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();

    for value in values {
        match index.get(&value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value.clone(), counts.len());
                counts.push((value, 1));
            }
        }
    }

    // stable sort keeps first-appearance order among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// The most frequent value, `None` for empty input.
pub fn mode<K, I>(values: I) -> Option<K>
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = K>,
{
    value_counts(values).into_iter().next().map(|(k, _)| k)
}

/// Converts counts into labelled entries with their share of the total.
pub fn count_entries<K: Display>(counts: &[(K, usize)]) -> Vec<CountEntry> {
    let total: usize = counts.iter().map(|(_, n)| n).sum();
    counts
        .iter()
        .map(|(k, n)| CountEntry {
            label: k.to_string(),
            count: *n,
            share: if total == 0 {
                0.0
            } else {
                *n as f64 / total as f64
            },
        })
        .collect()
}

/// Requests per calendar day, in date order.
pub fn daily_counts(days: &[NaiveDate]) -> BTreeMap<NaiveDate, usize> {
    let mut out = BTreeMap::new();
    for day in days {
        *out.entry(*day).or_insert(0) += 1;
    }
    out
}

/// The day with the most requests. Ties resolve to the earliest day.
pub fn busiest_in_series(daily: &BTreeMap<NaiveDate, usize>) -> Option<NaiveDate> {
    let mut best: Option<(NaiveDate, usize)> = None;
    for (day, n) in daily {
        if best.is_none_or(|(_, b)| *n > b) {
            best = Some((*day, *n));
        }
    }
    best.map(|(d, _)| d)
}

/// Requests per hour of day, all 24 hours included.
pub fn hourly_counts(hours: &[u32]) -> [usize; 24] {
    let mut out = [0usize; 24];
    for h in hours {
        if let Some(slot) = out.get_mut(*h as usize) {
            *slot += 1;
        }
    }
    out
}

/// Splits `values` into `bins` equal-width buckets spanning min..=max.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min {
        (max - min) / bins as f64
    } else {
        1.0
    };

    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Pairwise Pearson correlations; `None` where undefined.
pub fn correlation_matrix(series: &[Vec<f64>]) -> Vec<Vec<Option<f64>>> {
    series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect()
}
