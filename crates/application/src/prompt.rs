//! Prompt construction shared by every provider adapter.
//!
//! The user turn is laid out as passage, question, framing hint, then the
//! enumerated choices (multiple-choice) or the numeric answer protocol
//! (free-response). Whether a multiple-choice question asks for the wrong
//! statement or the right one is detected from negation markers in the
//! question text and spelled out to the model.

use exam_bench_common::EvaluationConfig;
use exam_bench_domain::AnswerKind;

/// How a provider is asked for JSON output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    /// The provider enforces JSON via a request parameter
    Native,
    /// JSON is requested only in the prompt text, with a strict suffix
    PromptOnly,
}

/// Whether a multiple-choice question looks for the correct or incorrect option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Find the statement consistent with the passage
    Positive,
    /// Find the statement that is wrong or inconsistent
    Negative,
}

/// System and user turns for one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Single-turn text for providers without a system role
    pub fn inline(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// The question being sent to a model
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    pub question_text: &'a str,
    pub choices: &'a [String],
    pub passage: Option<&'a str>,
    pub kind: AnswerKind,
}

impl<'a> SolveRequest<'a> {
    pub fn new(question_text: &'a str, choices: &'a [String], passage: Option<&'a str>) -> Self {
        let kind = if choices.is_empty() {
            AnswerKind::FreeResponse
        } else {
            AnswerKind::MultipleChoice
        };
        Self {
            question_text,
            choices,
            passage,
            kind,
        }
    }

    pub fn is_subjective(&self) -> bool {
        self.kind.is_subjective()
    }
}

const MULTIPLE_CHOICE_SYSTEM: &str = r#"당신은 대한민국 수능 문제를 푸는 AI입니다.

문제를 신중하게 분석하고 반드시 JSON 형식으로 답변하세요:

{
  "answer": 3,
  "reasoning": "답을 선택한 상세한 이유를 설명합니다..."
}

중요 지침:
1. **지문 내용에만 근거**하여 답변하세요
   - 지문에 명시된 내용을 우선하세요
   - 외부 지식을 과도하게 의존하지 마세요

2. **핵심 논지와 맥락을 파악**하세요
   - "~라고 오해되어 온 경향", "~라고 보았다" 같은 한정어를 주의하세요
   - 전체 문맥을 고려하여 판단하세요

3. **형식 준수**
   - 반드시 JSON 형식으로만 답변하세요
   - answer는 1~5 사이의 숫자여야 합니다
   - reasoning은 구체적이고 논리적이어야 합니다"#;

const FREE_RESPONSE_SYSTEM: &str = r#"당신은 대한민국 수능 수학 문제를 푸는 AI입니다.

문제를 단계별로 풀고 반드시 JSON 형식으로 답변하세요:

{
  "answer": 12,
  "reasoning": "풀이 과정을 단계별로 설명합니다..."
}

중요 지침:
1. answer에는 최종 답을 숫자 하나로만 쓰세요 (예: 12, 3.5, -2)
   - 단위, 수식, 문장을 넣지 마세요
2. reasoning에 풀이 과정을 구체적으로 쓰세요
   - 수식을 쓸 때 백슬래시는 \\ 로 이스케이프하세요
3. 반드시 JSON 형식으로만 답변하세요"#;

const STRICT_JSON_SUFFIX: &str = r#"

출력 규칙 (매우 중요):
- JSON만 출력하세요
- 마크다운 코드 블록(```)을 사용하지 마세요
- "다음과 같습니다", "해설:" 같은 추가 설명을 넣지 마세요
- 첫 글자부터 마지막 글자까지 오직 JSON만 출력하세요"#;

const NEGATIVE_HINT: &str = "이 문제는 '틀린 것', '일치하지 않는 것', '적절하지 않은 것'을 찾는 **부정형 질문**입니다. 각 선택지를 검토하여 지문과 맞지 않거나 틀린 선택지를 찾아야 합니다.";

const POSITIVE_HINT: &str = "이 문제는 '맞는 것', '일치하는 것', '적절한 것'을 찾는 **긍정형 질문**입니다. 각 선택지를 검토하여 지문과 일치하거나 맞는 선택지를 찾아야 합니다.";

const FREE_RESPONSE_INSTRUCTION: &str = "이 문제는 답이 하나의 수인 **단답형 문제**입니다. answer에는 최종 답을 정수 또는 소수 하나로만 쓰세요. 답을 구할 수 없으면 answer에 0을 쓰고, reasoning에는 그때까지의 풀이 과정을 반드시 설명하세요.";

/// Builds prompts from exam questions
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    negation_markers: Vec<String>,
}

impl PromptBuilder {
    pub fn new(negation_markers: Vec<String>) -> Self {
        Self { negation_markers }
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self::new(config.negation_markers.clone())
    }

    /// Detect negative framing from the question text
    pub fn framing(&self, question_text: &str) -> Framing {
        let negative = self
            .negation_markers
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| question_text.contains(marker.as_str()));
        if negative {
            Framing::Negative
        } else {
            Framing::Positive
        }
    }

    pub fn system_prompt(&self, kind: AnswerKind, style: JsonStyle) -> String {
        let base = match kind {
            AnswerKind::MultipleChoice => MULTIPLE_CHOICE_SYSTEM,
            AnswerKind::FreeResponse => FREE_RESPONSE_SYSTEM,
        };
        match style {
            JsonStyle::Native => base.to_string(),
            JsonStyle::PromptOnly => format!("{}{}", base, STRICT_JSON_SUFFIX),
        }
    }

    pub fn user_prompt(&self, request: &SolveRequest<'_>) -> String {
        let mut prompt = String::new();

        if let Some(passage) = request.passage.filter(|p| !p.trim().is_empty()) {
            prompt.push_str("다음 지문을 읽고 문제를 푸세요:\n\n");
            prompt.push_str(passage);
            prompt.push_str("\n\n");
        }

        prompt.push_str("문제: ");
        prompt.push_str(request.question_text);
        prompt.push_str("\n\n");

        match request.kind {
            AnswerKind::MultipleChoice => {
                let hint = match self.framing(request.question_text) {
                    Framing::Negative => NEGATIVE_HINT,
                    Framing::Positive => POSITIVE_HINT,
                };
                prompt.push_str("⚠️ 주의: ");
                prompt.push_str(hint);
                prompt.push_str("\n\n선택지:\n");
                for (index, choice) in request.choices.iter().enumerate() {
                    prompt.push_str(&format!("{}. {}\n", index + 1, choice));
                }
            }
            AnswerKind::FreeResponse => {
                prompt.push_str("⚠️ 주의: ");
                prompt.push_str(FREE_RESPONSE_INSTRUCTION);
                prompt.push('\n');
            }
        }

        prompt
    }

    pub fn build(&self, request: &SolveRequest<'_>, style: JsonStyle) -> Prompt {
        Prompt {
            system: self.system_prompt(request.kind, style),
            user: self.user_prompt(request),
        }
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::from_config(&EvaluationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices() -> Vec<String> {
        ["가", "나", "다", "라", "마"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_negative_framing_detected() {
        let builder = PromptBuilder::default();

        assert_eq!(
            builder.framing("윗글의 내용과 일치하지 않는 것은?"),
            Framing::Negative
        );
        assert_eq!(builder.framing("윗글에 대한 이해로 적절한 것은?"), Framing::Positive);
    }

    #[test]
    fn test_user_prompt_layout() {
        let builder = PromptBuilder::default();
        let choices = choices();
        let request = SolveRequest::new("적절하지 않은 것은?", &choices, Some("지문 본문"));

        let prompt = builder.user_prompt(&request);

        let passage_at = prompt.find("다음 지문을 읽고 문제를 푸세요:\n\n지문 본문").unwrap();
        let question_at = prompt.find("문제: 적절하지 않은 것은?").unwrap();
        let hint_at = prompt.find("부정형 질문").unwrap();
        let choices_at = prompt.find("선택지:\n1. 가\n2. 나").unwrap();
        assert!(passage_at < question_at && question_at < hint_at && hint_at < choices_at);
        assert!(prompt.ends_with("5. 마\n"));
    }

    #[test]
    fn test_free_response_prompt_has_fallback_protocol() {
        let builder = PromptBuilder::default();
        let request = SolveRequest::new("x의 값을 구하시오.", &[], None);

        let prompt = builder.build(&request, JsonStyle::Native);

        assert!(request.is_subjective());
        assert!(!prompt.user.contains("다음 지문"));
        assert!(!prompt.user.contains("선택지"));
        assert!(prompt.user.contains("answer에 0을 쓰고"));
        assert!(prompt.system.contains("\"answer\": 12"));
    }

    #[test]
    fn test_prompt_only_style_adds_strict_suffix() {
        let builder = PromptBuilder::default();

        let native = builder.system_prompt(AnswerKind::MultipleChoice, JsonStyle::Native);
        let strict = builder.system_prompt(AnswerKind::MultipleChoice, JsonStyle::PromptOnly);

        assert!(!native.contains("마크다운 코드 블록"));
        assert!(strict.starts_with(&native));
        assert!(strict.contains("오직 JSON만 출력하세요"));
    }

    #[test]
    fn test_custom_markers() {
        let builder = PromptBuilder::new(vec!["NOT".into(), String::new()]);

        assert_eq!(builder.framing("Which is NOT true?"), Framing::Negative);
        assert_eq!(builder.framing("Which is true?"), Framing::Positive);
    }
}
