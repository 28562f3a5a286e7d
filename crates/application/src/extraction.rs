//! Response extraction - turning free-form model output into an answer
//!
//! Providers fail in different ways: JSON wrapped in markdown fences, a draft
//! block followed by a corrected one, unescaped LaTeX inside the reasoning,
//! or no JSON at all. Extraction runs an ordered pipeline of fallible steps
//! and the first step that yields an answer valid for the question kind wins:
//!
//! 1. the whole (cleaned) output as one JSON object
//! 2. every top-level `{...}` block, scanned left to right
//! 3. regular-expression heuristics over the raw text
//!
//! Returning `None` means no valid answer, which is distinct from option 0.

use exam_bench_domain::{Answer, AnswerKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Pipeline step that produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// The whole response was a JSON object
    WholeDocument,
    /// One of several JSON-looking blocks in the response
    CandidateBlock,
    /// Regular-expression fallback
    Heuristic,
}

/// An answer recovered from model output
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub answer: Answer,
    /// The `reasoning` field, when the answer came from JSON
    pub reasoning: Option<String>,
    pub method: ExtractionMethod,
    /// The JSON text the answer was read from, after any repair
    pub json: Option<String>,
    /// Whether LaTeX escape repair was needed to parse it
    pub repaired: bool,
}

type ExtractionStep = fn(&str, AnswerKind) -> Option<Extraction>;

const PIPELINE: [ExtractionStep; 3] = [whole_document, candidate_blocks, heuristic];

/// Run the extraction pipeline
pub fn extract_answer(raw: &str, kind: AnswerKind) -> Option<Extraction> {
    PIPELINE.iter().find_map(|step| step(raw, kind))
}

/// First JSON block in the output whose answer is valid for the question kind
pub fn extract_json_block(raw: &str, is_subjective: bool) -> Option<String> {
    let kind = if is_subjective {
        AnswerKind::FreeResponse
    } else {
        AnswerKind::MultipleChoice
    };
    candidate_blocks(raw, kind).and_then(|extraction| extraction.json)
}

/// Regex fallback for multiple-choice answers; only options 1-5 are returned
pub fn extract_answer_heuristic(raw: &str) -> Option<u8> {
    CHOICE_PATTERNS.iter().find_map(|pattern| {
        pattern
            .captures_iter(raw)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<i64>().ok())
            .find_map(|value| match Answer::choice(value)? {
                Answer::Choice(option) => Some(option),
                _ => None,
            })
    })
}

/// Regex fallback for free-response answers (`answer: 12.5`)
pub fn extract_numeric_heuristic(raw: &str) -> Option<f64> {
    NUMERIC_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<f64>().ok())
        .find(|value| value.is_finite())
}

// ============================================================================
// Pipeline steps
// ============================================================================

fn whole_document(raw: &str, kind: AnswerKind) -> Option<Extraction> {
    let cleaned = clean_markup(raw);
    let text = cleaned.trim();
    if !(text.starts_with('{') && text.ends_with('}')) {
        return None;
    }

    let (object, json, repaired) = parse_object(text)?;
    let answer = answer_from_value(object.get("answer")?, kind)?;

    Some(Extraction {
        answer,
        reasoning: reasoning_from(&object),
        method: ExtractionMethod::WholeDocument,
        json: Some(json),
        repaired,
    })
}

fn candidate_blocks(raw: &str, kind: AnswerKind) -> Option<Extraction> {
    let cleaned = clean_markup(raw);

    top_level_blocks(&cleaned)
        .into_iter()
        .filter(|block| block.contains("\"answer\"") && block.contains("\"reasoning\""))
        .find_map(|block| {
            let (object, json, repaired) = parse_object(block)?;
            let answer = answer_from_value(object.get("answer")?, kind)?;
            Some(Extraction {
                answer,
                reasoning: reasoning_from(&object),
                method: ExtractionMethod::CandidateBlock,
                json: Some(json),
                repaired,
            })
        })
}

fn heuristic(raw: &str, kind: AnswerKind) -> Option<Extraction> {
    let answer = match kind {
        AnswerKind::MultipleChoice => Answer::Choice(extract_answer_heuristic(raw)?),
        AnswerKind::FreeResponse => Answer::numeric(extract_numeric_heuristic(raw)?)?,
    };

    Some(Extraction {
        answer,
        reasoning: None,
        method: ExtractionMethod::Heuristic,
        json: None,
        repaired: false,
    })
}

// ============================================================================
// Cleaning
// ============================================================================

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+\-]*").expect("valid fence pattern"));

static HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:#{1,6}\s+.*|\*\*[^*]+\*\*\s*:?|__[^_]+__\s*:?)\s*$")
        .expect("valid heading pattern")
});

/// Remove code fences and markdown heading lines outside JSON strings
fn clean_markup(raw: &str) -> String {
    let without_fences = FENCE.replace_all(raw, "");
    strip_heading_lines(&without_fences)
}

fn strip_heading_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut scanner = StringScanner::default();

    for line in text.split_inclusive('\n') {
        let inside_string = scanner.in_string;
        if !inside_string && HEADING.is_match(line.trim_end_matches(&['\r', '\n'][..])) {
            continue;
        }
        for ch in line.chars() {
            scanner.feed(ch);
        }
        out.push_str(line);
    }

    out
}

/// Tracks whether the scan position is inside a JSON string literal.
///
/// Quotes only open strings inside a brace block, so apostrophes and quotes
/// in surrounding prose do not desynchronize the scan.
#[derive(Default)]
struct StringScanner {
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl StringScanner {
    fn feed(&mut self, ch: char) {
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            return;
        }
        match ch {
            '"' if self.depth > 0 => self.in_string = true,
            '{' => self.depth += 1,
            '}' => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }
    }
}

// ============================================================================
// Block scanning
// ============================================================================

/// Every balanced top-level `{...}` block, left to right.
///
/// Braces inside string literals do not count. An opening brace that never
/// closes is skipped so that later blocks can still be found.
fn top_level_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut offset = 0;

    while let Some(relative) = text[offset..].find('{') {
        let start = offset + relative;
        match balanced_len(&text[start..]) {
            Some(len) => {
                blocks.push(&text[start..start + len]);
                offset = start + len;
            }
            None => offset = start + 1,
        }
    }

    blocks
}

/// Byte length of the balanced block at the start of `text`
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index + 1);
                }
            }
            _ => {}
        }
    }

    None
}

// ============================================================================
// Parsing and repair
// ============================================================================

/// Strict parse, then one LaTeX repair pass
fn parse_object(text: &str) -> Option<(Map<String, Value>, String, bool)> {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) {
        return Some((object, text.to_string(), false));
    }

    let repaired = repair_latex_escapes(text);
    match serde_json::from_str::<Value>(&repaired) {
        Ok(Value::Object(object)) => Some((object, repaired, true)),
        _ => None,
    }
}

const LATEX_COMMANDS: &[&str] = &[
    "frac", "dfrac", "tfrac", "sqrt", "times", "cdot", "cdots", "ldots", "div", "pm", "mp",
    "le", "leq", "ge", "geq", "ne", "neq", "approx", "equiv", "infty", "pi", "theta", "alpha",
    "beta", "gamma", "delta", "lambda", "sigma", "omega", "sum", "prod", "int", "lim", "log",
    "ln", "sin", "cos", "tan", "left", "right", "text", "mathrm", "mathbf", "overline",
    "underline", "vec", "angle", "circ", "therefore", "because", "quad", "in", "cup", "cap",
    "subset", "to", "rightarrow", "Rightarrow", "binom", "begin", "end",
];

/// Escape backslashes that JSON would reject or misread as control escapes.
///
/// Already-escaped pairs (`\\`) and `\uXXXX` escapes are kept. LaTeX commands
/// such as `\frac` or `\times` are escaped even though `\f` and `\t` are valid
/// JSON escapes, as are bracket-delimited math markers `\(`, `\)`, `\[`, `\]`.
pub fn repair_latex_escapes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 16);
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch != '\\' {
            out.push(ch);
            i += 1;
            continue;
        }

        let next = chars.get(i + 1).copied();
        match next {
            Some('\\') => {
                out.push_str("\\\\");
                i += 2;
                continue;
            }
            Some('(' | ')' | '[' | ']') => out.push_str("\\\\"),
            Some(c) if c.is_ascii_alphabetic() => {
                let word: String = chars[i + 1..]
                    .iter()
                    .take_while(|c| c.is_ascii_alphabetic())
                    .collect();
                if LATEX_COMMANDS.contains(&word.as_str()) {
                    out.push_str("\\\\");
                } else if c == 'u' && is_unicode_escape(&chars[i + 2..]) {
                    out.push('\\');
                } else if matches!(c, 'b' | 'f' | 'n' | 'r' | 't') {
                    out.push('\\');
                } else {
                    out.push_str("\\\\");
                }
            }
            Some('"' | '/') => out.push('\\'),
            _ => out.push_str("\\\\"),
        }
        i += 1;
    }

    out
}

fn is_unicode_escape(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(|c| c.is_ascii_hexdigit())
}

// ============================================================================
// Answer validation
// ============================================================================

fn answer_from_value(value: &Value, kind: AnswerKind) -> Option<Answer> {
    match kind {
        AnswerKind::MultipleChoice => {
            let option = match value {
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }?;
            Answer::choice(option)
        }
        AnswerKind::FreeResponse => {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
                _ => None,
            }?;
            Answer::numeric(number)
        }
    }
}

fn reasoning_from(object: &Map<String, Value>) -> Option<String> {
    match object.get("reasoning")? {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

// ============================================================================
// Heuristic patterns
// ============================================================================

/// Tried in order: "answer:", "choice:", a lone digit line, digit + counter word
static CHOICE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"(?im)(?:답|정답|answer)["']?\s*:?\s*["']?([0-9])"#,
        r"(?im)선택\s*:?\s*([0-9])",
        r"(?m)^\s*([0-9])\s*(?:번)?\s*$",
        r"([0-9])\s*번(?:이|을|이다)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid heuristic pattern"))
    .collect()
});

static NUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:답|정답|answer)["']?\s*[:：]?\s*["']?(-?[0-9]+(?:\.[0-9]+)?)"#)
        .expect("valid numeric pattern")
});
