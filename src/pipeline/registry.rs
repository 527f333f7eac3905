//! Paragraph number registry: which numbers are real paragraph starts.
//!
//! A numbered line is not necessarily a paragraph: list items, stray
//! footnote numbers and quoted statute sections share the `<n>. text`
//! shape. The policy decides how much to trust the numbering.

use crate::config::NumberingPolicy;
use crate::pipeline::classify::numbered_text_number;
use crate::pipeline::noise::LineRecord;
use std::collections::BTreeSet;
use tracing::debug;

/// The set of numbers recognised as paragraph starts in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphNumbers(BTreeSet<u32>);

impl ParagraphNumbers {
    pub fn contains(&self, number: u32) -> bool {
        self.0.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u32> {
        self.iter().collect()
    }
}

impl FromIterator<u32> for ParagraphNumbers {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Scan cleaned lines for `<n>.<text>` lines and collect their numbers.
///
/// * [`NumberingPolicy::Strict`]: a number counts only if it is exactly one
///   more than the last accepted number (starting from 0), so the numbering
///   `1, 2, 4, 5` yields `{1, 2}`.
/// * [`NumberingPolicy::Permissive`]: every numbered line counts, giving
///   `{1, 2, 4, 5}` for the same text.
pub fn valid_numbers(lines: &[LineRecord<'_>], policy: NumberingPolicy) -> ParagraphNumbers {
    let candidates = lines.iter().filter_map(|line| numbered_text_number(line.raw));

    let numbers: ParagraphNumbers = match policy {
        NumberingPolicy::Permissive => candidates.collect(),
        NumberingPolicy::Strict => {
            let mut last = 0u32;
            candidates
                .filter(|&n| {
                    if Some(n) == last.checked_add(1) {
                        last = n;
                        true
                    } else {
                        false
                    }
                })
                .collect()
        }
    };

    debug!(
        "Recognised {} paragraph numbers ({:?} policy)",
        numbers.len(),
        policy
    );
    numbers
}
