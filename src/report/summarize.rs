use indexmap::IndexMap;

use crate::model::{AnswerBucket, AnswerDistribution};

const SEPARATOR: char = '-';

/// Counts a column of answers into chart buckets.
///
/// Missing and blank answers are dropped. Answers that differ only by case or
/// by `-` versus space share a bucket; the first spelling seen names it.
/// Buckets keep first-seen order so legends are reproducible.
pub fn summarize<I, S>(values: I) -> AnswerDistribution
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut raw_counts = IndexMap::<String, usize>::new();
    for value in values.into_iter().flatten() {
        let value = value.as_ref();
        if value.trim().is_empty() {
            continue;
        }
        *raw_counts.entry(value.to_string()).or_insert(0) += 1;
    }

    // key -> (canonical spelling, count)
    let mut merged = IndexMap::<String, (String, usize)>::new();
    for (raw, count) in raw_counts {
        let key = normalization_key(&raw);
        merged
            .entry(key)
            .and_modify(|(_, total)| *total += count)
            .or_insert((raw, count));
    }

    let buckets = merged
        .into_values()
        .map(|(canonical, count)| AnswerBucket {
            label: display_label(&canonical, count),
            count,
        })
        .collect::<Vec<AnswerBucket>>();
    let total = buckets.iter().map(|bucket| bucket.count).sum();

    AnswerDistribution { buckets, total }
}

/// Lower-cased words of the answer, with `-` treated as a word break.
pub fn normalization_key(raw: &str) -> String {
    raw.to_lowercase()
        .replace(SEPARATOR, " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

pub fn display_label(canonical: &str, count: usize) -> String {
    let words = canonical
        .replace(SEPARATOR, " ")
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<String>>();
    format!("{} ({count})", words.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
