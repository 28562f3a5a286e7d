//! Question subset selection, e.g. `1-5,8,10-12`.

use crate::errors::SelectionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A set of 1-based question numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QuestionSelection {
    numbers: BTreeSet<u32>,
}

impl QuestionSelection {
    /// Parse range/list syntax such as `1-5,8,10-12`.
    ///
    /// Whitespace around elements is ignored.
    pub fn parse(input: &str) -> Result<Self, SelectionError> {
        if input.trim().is_empty() {
            return Err(SelectionError::Empty);
        }

        let mut numbers = BTreeSet::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(SelectionError::EmptyElement(input.to_string()));
            }

            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_number(start)?;
                    let end = parse_number(end)?;
                    if start > end {
                        return Err(SelectionError::ReversedRange { start, end });
                    }
                    numbers.extend(start..=end);
                }
                None => {
                    numbers.insert(parse_number(part)?);
                }
            }
        }

        Ok(Self { numbers })
    }

    /// Selection containing exactly the given numbers
    pub fn from_numbers(numbers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            numbers: numbers.into_iter().collect(),
        }
    }

    /// Whether a question number is selected
    pub fn contains(&self, number: u32) -> bool {
        self.numbers.contains(&number)
    }

    /// Selected numbers in ascending order
    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.numbers.iter().copied()
    }

    /// Number of selected questions
    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }
}

fn parse_number(raw: &str) -> Result<u32, SelectionError> {
    let raw = raw.trim();
    let number = raw
        .parse::<u32>()
        .map_err(|_| SelectionError::InvalidNumber(raw.to_string()))?;
    if number == 0 {
        return Err(SelectionError::Zero);
    }
    Ok(number)
}

impl FromStr for QuestionSelection {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for QuestionSelection {
    type Error = SelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QuestionSelection> for String {
    fn from(value: QuestionSelection) -> Self {
        value.to_string()
    }
}

impl fmt::Display for QuestionSelection {
    /// Compact form with consecutive numbers folded into ranges
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        let mut iter = self.numbers.iter().copied().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if start == end {
                parts.push(start.to_string());
            } else {
                parts.push(format!("{}-{}", start, end));
            }
        }
        f.write_str(&parts.join(","))
    }
}
