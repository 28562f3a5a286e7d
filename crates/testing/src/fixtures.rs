//! Exam fixtures for evaluator and aggregation tests.

use crate::builders::{ExamBuilder, QuestionBuilder};
use exam_bench_domain::{Exam, ModelSpec, Provider};

/// Three multiple-choice questions keyed 1, 2, 3, two points each
pub fn three_question_exam() -> Exam {
    ExamBuilder::new("scenario-2025")
        .with_questions((1..=3).map(|n| QuestionBuilder::multiple_choice(n, n as i64).build()))
        .build()
}

/// English paper: questions 1-15 are listening items, 16-20 are reading
pub fn listening_exam() -> Exam {
    ExamBuilder::new("2025-english")
        .with_subject("english")
        .with_questions((1..=20).map(|n| {
            let builder = QuestionBuilder::multiple_choice(n, 1);
            if n <= 15 {
                builder
                    .with_text(format!("[듣기] 다음을 듣고, {}번 질문에 답하시오.", n))
                    .build()
            } else {
                builder.build()
            }
        }))
        .build()
}

/// Passage-linked Korean paper with a blank and an unkeyed question
pub fn korean_exam() -> Exam {
    ExamBuilder::new("2025-korean")
        .with_passage("p1", "독서는 글을 읽고 의미를 구성하는 과정이다.")
        .with_question(
            QuestionBuilder::multiple_choice(1, 3)
                .with_text("윗글의 내용과 일치하지 않는 것은?")
                .with_passage_id("p1")
                .build(),
        )
        .with_question(
            QuestionBuilder::multiple_choice(2, 5)
                .with_embedded_passage("(가) 별도 지문")
                .with_passage_id("p1")
                .build(),
        )
        .with_question(QuestionBuilder::multiple_choice(3, 1).with_text("   ").build())
        .with_question(QuestionBuilder::multiple_choice(4, 2).with_key(None).build())
        .build()
}

/// Math paper with both question kinds
pub fn math_exam() -> Exam {
    ExamBuilder::new("2025-math")
        .with_subject("math")
        .with_question(QuestionBuilder::multiple_choice(1, 4).build())
        .with_question(QuestionBuilder::free_response(22, 5.5).build())
        .build()
}

/// Registry entries covering every provider
pub fn sample_models() -> Vec<ModelSpec> {
    let mut disabled = ModelSpec::new("gemma", Provider::Google, "gemma-3-27b-it");
    disabled.enabled = false;

    vec![
        ModelSpec::new("gpt-4o", Provider::OpenAi, "gpt-4o-2024-08-06"),
        ModelSpec::new("claude-sonnet", Provider::Anthropic, "claude-sonnet-4-5"),
        ModelSpec::new("gemini-pro", Provider::Google, "gemini-2.5-pro"),
        ModelSpec::new("solar-pro", Provider::Upstage, "solar-pro2"),
        ModelSpec::new("sonar", Provider::Perplexity, "sonar-pro"),
        disabled,
    ]
}
