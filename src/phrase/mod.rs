//! Questionnaire and quote generation.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tera::{Context as TeraContext, Tera};
use tracing::debug;

use crate::providers::{Provider, ProviderUsage};

const QUOTE_PROMPT_TEMPLATE: &str = include_str!("prompts/quote_prompt.tera");
const SYSTEM_PROMPT_TEMPLATE: &str = include_str!("prompts/system_prompt.tera");
pub const DEFAULT_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub text: &'static str,
    pub gloss: &'static str,
}

const QUESTIONS: [Question; 5] = [
    Question {
        text: "오늘 기분이 어떤가요?",
        gloss: "How are you feeling today?",
    },
    Question {
        text: "당신의 가장 소중한 것은 무엇인가요?",
        gloss: "What is most precious to you?",
    },
    Question {
        text: "애인이 있으신가요?",
        gloss: "Are you seeing someone?",
    },
    Question {
        text: "현재 가장 큰 고민거리가 무엇인가요?",
        gloss: "What is your biggest worry right now?",
    },
    Question {
        text: "소원이 무엇인가요?",
        gloss: "What do you wish for?",
    },
];

pub fn questions() -> &'static [Question] {
    &QUESTIONS
}

/// Every question needs a non-blank answer.
pub fn validate_answers(answers: &[String]) -> Result<()> {
    if answers.len() != QUESTIONS.len() {
        return Err(anyhow!(
            "expected {} answers, got {}",
            QUESTIONS.len(),
            answers.len()
        ));
    }
    if let Some(idx) = answers.iter().position(|answer| answer.trim().is_empty()) {
        return Err(anyhow!(
            "please answer every question (question {} is empty: {})",
            idx + 1,
            QUESTIONS[idx].gloss
        ));
    }
    Ok(())
}

#[derive(Serialize)]
struct PromptItem<'a> {
    question: &'a str,
    answer: &'a str,
}

pub fn render_quote_prompt(answers: &[String], max_chars: usize) -> Result<String> {
    validate_answers(answers)?;
    let items = QUESTIONS
        .iter()
        .zip(answers)
        .map(|(question, answer)| PromptItem {
            question: question.text,
            answer: answer.trim(),
        })
        .collect::<Vec<_>>();
    let mut context = TeraContext::new();
    context.insert("items", &items);
    context.insert("max_chars", &max_chars);
    let prompt = Tera::one_off(QUOTE_PROMPT_TEMPLATE, &context, false)
        .with_context(|| "failed to render quote prompt")?;
    Ok(prompt.trim_end().to_string())
}

pub fn render_system_prompt() -> Result<String> {
    let prompt = Tera::one_off(SYSTEM_PROMPT_TEMPLATE, &TeraContext::new(), false)
        .with_context(|| "failed to render system prompt")?;
    Ok(prompt.trim_end().to_string())
}

/// Strips whitespace, wrapping quotation marks and a leading list marker
/// from a model reply. Only the first non-empty line is kept.
pub fn clean_quote(raw: &str) -> Option<String> {
    let line = raw.lines().map(str::trim).find(|line| !line.is_empty())?;
    let line = line
        .strip_prefix("1.")
        .or_else(|| line.strip_prefix("- "))
        .unwrap_or(line)
        .trim();
    let quote = line
        .trim_matches(|ch: char| matches!(ch, '"' | '\'' | '“' | '”' | '‘' | '’' | '「' | '」'))
        .trim();
    if quote.is_empty() {
        None
    } else {
        Some(quote.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct QuoteOutput {
    pub quote: String,
    pub model: Option<String>,
    pub usage: Option<ProviderUsage>,
}

#[derive(Debug, Clone)]
pub struct PhraseGenerator<P: Provider> {
    provider: P,
    max_chars: usize,
}

impl<P: Provider> PhraseGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        if max_chars > 0 {
            self.max_chars = max_chars;
        }
        self
    }

    pub async fn generate(&self, answers: &[String]) -> Result<QuoteOutput> {
        let prompt = render_quote_prompt(answers, self.max_chars)?;
        let system = render_system_prompt()?;
        debug!("quote prompt:\n{}", prompt);
        let response = self
            .provider
            .clone()
            .append_system_input(system)
            .append_user_input(prompt)
            .complete()
            .await
            .with_context(|| "phrase generation failed")?;
        let quote = clean_quote(&response.text)
            .ok_or_else(|| anyhow!("phrase generation returned an empty reply"))?;
        Ok(QuoteOutput {
            quote,
            model: response.model,
            usage: response.usage,
        })
    }
}
