//! Grounded prompt construction.

use std::fmt;

use crate::query::MatchSet;

/// Answer the model must give when the context does not contain one.
pub const REFUSAL: &str = "I'm sorry but I can't provide an answer.";

/// Fixed instruction preceding the retrieved passages.
pub const INSTRUCTION_HEADER: &str = "You are an AI assistant providing helpful advice. \
Extensively answer the provided question as truthfully and detailed as possible using the \
provided context and sources, and if the answer is not contained within the text below, \
say \"I'm sorry but I can't provide an answer.\"\n\nContext:\n";

/// Prompt for one query: instruction header, passage body, question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    header: String,
    body: String,
    question: String,
}

impl PromptContext {
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The full prompt text sent as a single user message.
    #[must_use]
    pub fn to_prompt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PromptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}\n\n Q: {}\n A:",
            self.header, self.body, self.question
        )
    }
}

/// Builds [`PromptContext`]s. Pure: equal inputs give equal prompts.
///
/// Passages are used in match order with no deduplication or truncation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder;

impl ContextBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn build(&self, question: &str, matches: &MatchSet) -> PromptContext {
        let capacity = matches
            .iter()
            .map(|p| p.content.len() + p.source.len() + 10)
            .sum();
        let mut body = String::with_capacity(capacity);
        for passage in matches {
            body.push_str(&passage.content);
            body.push_str(" Source: ");
            body.push_str(&passage.source);
            body.push_str("\n\n");
        }

        tracing::debug!(
            passages = matches.len(),
            body_bytes = body.len(),
            "prompt context built"
        );

        PromptContext {
            header: INSTRUCTION_HEADER.to_owned(),
            body,
            question: question.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::query::Passage;

    fn passage(id: &str, content: &str, source: &str) -> Passage {
        Passage {
            id: id.into(),
            content: content.into(),
            source: source.into(),
            score: 0.5,
        }
    }

    #[test]
    fn header_carries_refusal_instruction() {
        assert!(INSTRUCTION_HEADER.contains(REFUSAL));
        assert!(INSTRUCTION_HEADER.ends_with("\n\nContext:\n"));
    }

    #[test]
    fn empty_matches_yield_header_and_question() {
        let ctx = ContextBuilder::new().build("What is X?", &MatchSet::default());
        assert!(ctx.body().is_empty());
        assert_eq!(
            ctx.to_prompt(),
            format!("{INSTRUCTION_HEADER}\n\n Q: What is X?\n A:")
        );
    }

    #[test]
    fn passages_are_labeled_in_order() {
        let matches = MatchSet::new(vec![
            passage("1", "Alpha text.", "docA"),
            passage("2", "Beta text.", "docB"),
        ]);
        let ctx = ContextBuilder::new().build("Why?", &matches);
        assert_eq!(
            ctx.body(),
            "Alpha text. Source: docA\n\nBeta text. Source: docB\n\n"
        );
        assert_eq!(
            ctx.to_prompt(),
            format!(
                "{INSTRUCTION_HEADER}Alpha text. Source: docA\n\nBeta text. Source: docB\n\n\n\n Q: Why?\n A:"
            )
        );
    }

    #[test]
    fn duplicate_passages_are_kept() {
        let matches = MatchSet::new(vec![
            passage("1", "Same.", "docA"),
            passage("2", "Same.", "docA"),
        ]);
        let ctx = ContextBuilder::new().build("q", &matches);
        assert_eq!(ctx.body().matches("Same. Source: docA").count(), 2);
    }

    proptest! {
        #[test]
        fn build_is_pure(
            question in ".{0,40}",
            items in proptest::collection::vec((".{0,60}", "[a-z]{1,8}"), 0..6),
        ) {
            let matches = MatchSet::new(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, (content, source))| passage(&i.to_string(), content, source))
                    .collect(),
            );
            let builder = ContextBuilder::new();
            let first = builder.build(&question, &matches);
            let second = builder.build(&question, &matches);
            prop_assert_eq!(first.to_prompt(), second.to_prompt());
            prop_assert!(first.to_prompt().starts_with(INSTRUCTION_HEADER));
            let suffix = format!("\n\n Q: {question}\n A:");
            prop_assert!(first.to_prompt().ends_with(&suffix));
        }
    }
}
