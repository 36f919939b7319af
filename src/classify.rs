//! Assigns recognized text lines to the roll and customer fields.
//!
//! Lines are first filtered by height relative to the tallest line, then
//! cleaned. The most digit-dense line becomes the roll; the customer is the
//! tallest keyword line, or failing that the most letter-dense line.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::models::{ClassifiedFields, TextLine};
use crate::tuning::TuningParameters;

/// Substrings that mark a customer line, matched case-insensitively.
pub const CUSTOMER_KEYWORDS: [&str; 3] = ["CUSTOMER", "CUST", "CLIENT"];

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""[^"]*"|'[^']*'"#).unwrap());
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_%/\-]").unwrap());

/// Normalize one raw line. Returns an empty string when nothing survives.
pub fn clean_line(raw: &str) -> String {
    let text = raw.replace(' ', "_");
    let text = QUOTED.replace_all(&text, "");
    let text = BRACKETED.replace_all(&text, "");
    let text = DISALLOWED.replace_all(&text, "");
    text.trim_matches('_').to_string()
}

fn digit_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_digit()).count()
}

fn letter_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_alphabetic()).count()
}

fn has_keyword(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    CUSTOMER_KEYWORDS.iter().any(|k| upper.contains(k))
}

/// Index of the first entry with the strictly greatest positive score.
fn first_max_by<T>(items: &[T], score: impl Fn(&T) -> usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (i, item) in items.iter().enumerate() {
        let s = score(item);
        if s == 0 {
            continue;
        }
        if best.is_none_or(|(_, top)| s > top) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}

/// A line that survived height filtering and cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanLine {
    pub text: String,
    pub height: u32,
}

/// Height-filter and clean the raw lines, keeping their order.
pub fn prepare_lines(lines: &[TextLine], params: &TuningParameters) -> Vec<CleanLine> {
    let tallest = lines.iter().map(|l| l.height).max().unwrap_or(0);
    if tallest == 0 {
        return Vec::new();
    }

    let threshold = if params.use_line_height {
        tallest as f64 * params.line_height_percent
    } else {
        0.0
    };

    lines
        .iter()
        .filter(|line| {
            let keep = line.height as f64 >= threshold;
            if !keep {
                debug!(text = %line.text, height = line.height, threshold, "Dropping short line");
            }
            keep
        })
        .filter_map(|line| {
            let text = clean_line(&line.text);
            (!text.is_empty()).then(|| CleanLine {
                text,
                height: line.height,
            })
        })
        .collect()
}

/// Pick the roll and customer fields out of recognized lines.
pub fn classify(lines: &[TextLine], params: &TuningParameters) -> ClassifiedFields {
    let cleaned = prepare_lines(lines, params);
    if cleaned.is_empty() {
        return ClassifiedFields::default();
    }

    let roll_index = first_max_by(&cleaned, |l| digit_count(&l.text));
    let roll = roll_index
        .map(|i| {
            let text = &cleaned[i].text;
            match text.rfind('_') {
                Some(pos) => text[pos + 1..].to_string(),
                None => text.clone(),
            }
        })
        .unwrap_or_default();

    // Exclusion is by position: an identical line elsewhere stays eligible.
    let others: Vec<&CleanLine> = cleaned
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != roll_index)
        .map(|(_, l)| l)
        .collect();

    let keyword_line = others
        .iter()
        .copied()
        .filter(|l| has_keyword(&l.text))
        .fold(None::<&CleanLine>, |best, l| match best {
            Some(b) if b.height >= l.height => Some(b),
            _ => Some(l),
        });

    let customer = match keyword_line {
        Some(line) => line.text.clone(),
        None => first_max_by(&others, |l| letter_count(&l.text))
            .map(|i| others[i].text.clone())
            .unwrap_or_default(),
    };

    debug!(%roll, %customer, lines = cleaned.len(), "Classified label lines");
    ClassifiedFields { roll, customer }
}
