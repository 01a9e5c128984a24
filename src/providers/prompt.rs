//! Prompt templates per analysis type
//!
//! Each analysis type carries its own system prompt, token budget, and
//! sampling temperature. Summaries get the most room; action item extraction
//! runs cooler and shorter so the output stays list-shaped.

use crate::router::AnalysisType;

/// A fully rendered prompt ready for any backend
#[derive(Debug, Clone)]
pub struct AnalysisPrompt {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl AnalysisPrompt {
    /// Render the prompt for an analysis type over the given email text
    pub fn build(analysis_type: AnalysisType, text: &str) -> Self {
        let (system, instruction, max_tokens, temperature) = match analysis_type {
            AnalysisType::Summary => (
                "You are an assistant that summarizes emails clearly and concisely.",
                "Summarize the following email in 2-3 sentences, preserving the \
                 key facts and any deadlines:",
                500,
                0.7,
            ),
            AnalysisType::ActionItems => (
                "You are an assistant that extracts concrete action items from emails.",
                "List the action items in the following email as short bullet \
                 points. If there are none, say so:",
                300,
                0.5,
            ),
            AnalysisType::Recommendations => (
                "You are an assistant that suggests how to respond to emails.",
                "Read the following email and recommend how the recipient should \
                 respond, including tone and priority:",
                400,
                0.6,
            ),
            AnalysisType::Custom => (
                "You are an assistant that analyzes emails.",
                "Analyze the following email:",
                400,
                0.7,
            ),
        };

        Self {
            system: system.to_string(),
            user: format!("{}\n\n{}", instruction, text),
            max_tokens,
            temperature,
        }
    }
}
