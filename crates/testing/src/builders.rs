//! Fluent builder pattern for constructing test data.

use exam_bench_domain::{
    Answer, AnswerKey, Correctness, DispatchMode, EvaluationRun, Exam, ModelResponse, Passage,
    Question, QuestionResult, DEFAULT_POINTS,
};
use std::time::Duration;

/// Builder for Question test instances
#[derive(Clone)]
pub struct QuestionBuilder {
    question: Question,
}

impl QuestionBuilder {
    /// Five-choice question with an integer key
    pub fn multiple_choice(number: u32, correct: i64) -> Self {
        Self {
            question: Question {
                question_id: format!("q{}", number),
                question_number: number,
                question_text: format!("{}번 문제: 윗글의 내용으로 적절한 것은?", number),
                choices: (1..=5).map(|i| format!("선택지 {}", i)).collect(),
                passage_id: None,
                passage: None,
                correct_answer: Some(AnswerKey::Integer(correct)),
                points: DEFAULT_POINTS,
                subject_type: None,
            },
        }
    }

    /// Short-answer question with a numeric key
    pub fn free_response(number: u32, correct: f64) -> Self {
        Self {
            question: Question {
                question_id: format!("q{}", number),
                question_number: number,
                question_text: format!("{}번 문제: 값을 구하시오.", number),
                choices: Vec::new(),
                passage_id: None,
                passage: None,
                correct_answer: Some(AnswerKey::Decimal(correct)),
                points: 4,
                subject_type: Some("short_answer".to_string()),
            },
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.question.question_text = text.into();
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.question.points = points;
        self
    }

    pub fn with_key(mut self, key: Option<AnswerKey>) -> Self {
        self.question.correct_answer = key;
        self
    }

    pub fn with_passage_id(mut self, passage_id: impl Into<String>) -> Self {
        self.question.passage_id = Some(passage_id.into());
        self
    }

    pub fn with_embedded_passage(mut self, text: impl Into<String>) -> Self {
        self.question.passage = Some(text.into());
        self
    }

    pub fn build(self) -> Question {
        self.question
    }
}

/// Builder for Exam test instances
#[derive(Clone)]
pub struct ExamBuilder {
    exam: Exam,
}

impl ExamBuilder {
    pub fn new(exam_id: impl Into<String>) -> Self {
        let exam_id = exam_id.into();
        Self {
            exam: Exam {
                title: format!("{} 모의고사", exam_id),
                exam_id,
                subject: "korean".to_string(),
                year: Some(2025),
                passages: Vec::new(),
                questions: Vec::new(),
            },
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.exam.subject = subject.into();
        self
    }

    pub fn with_passage(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.exam.passages.push(Passage {
            passage_id: id.into(),
            passage_text: text.into(),
        });
        self
    }

    pub fn with_question(mut self, question: Question) -> Self {
        self.exam.questions.push(question);
        self
    }

    pub fn with_questions(mut self, questions: impl IntoIterator<Item = Question>) -> Self {
        self.exam.questions.extend(questions);
        self
    }

    pub fn build(self) -> Exam {
        self.exam
    }
}

/// Builder for stored EvaluationRun instances, for aggregation tests
pub struct RunBuilder {
    exam: Exam,
    model_name: String,
    results: Vec<QuestionResult>,
}

impl RunBuilder {
    pub fn new(exam_id: impl Into<String>, subject: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            exam: ExamBuilder::new(exam_id).with_subject(subject).build(),
            model_name: model.into(),
            results: Vec::new(),
        }
    }

    /// Graded result for question `number`
    pub fn answered(mut self, number: u32, correct: bool, seconds: f64) -> Self {
        let question = QuestionBuilder::multiple_choice(number, 1).build();
        let chosen = if correct { 1 } else { 2 };
        let response = ModelResponse::answered(
            &self.model_name,
            Answer::Choice(chosen),
            "",
            "",
            Duration::from_secs_f64(seconds),
        );
        self.results.push(QuestionResult::scored(
            &question,
            &response,
            Correctness::from(Some(correct)),
        ));
        self
    }

    /// Skipped result for question `number`
    pub fn skipped(mut self, number: u32) -> Self {
        let question = QuestionBuilder::multiple_choice(number, 1).build();
        self.results.push(QuestionResult::skipped(&question, "listening"));
        self
    }

    pub fn build(self) -> EvaluationRun {
        EvaluationRun::new(
            &self.exam,
            self.model_name,
            DispatchMode::Sequential,
            None,
            self.results,
        )
    }
}
