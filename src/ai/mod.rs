//! All AI/LLM functionality

pub mod batch;
pub mod client;
pub mod prompt_builder;
pub mod response;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::models::{CategoryPlan, DigestSection, ExtractedItem};
use crate::errors::DigestError;

// Re-export main types for convenience
pub use client::{LlmClient, estimate_tokens};
pub use prompt_builder::ItemLimits;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Categorized summaries for `items`, in plan order, each category within
    /// the plan's cap.
    async fn summarize(
        &self,
        items: &[ExtractedItem],
        plan: &CategoryPlan,
    ) -> Result<Vec<DigestSection>, DigestError>;
}

/// Summarizer backed by the LLM client, batching items by prompt size.
pub struct LlmSummarizer {
    client: LlmClient,
    limits: ItemLimits,
    max_batch_chars: usize,
}

impl LlmSummarizer {
    #[must_use]
    pub fn new(client: LlmClient, limits: ItemLimits, max_batch_chars: usize) -> Self {
        Self {
            client,
            limits,
            max_batch_chars,
        }
    }

    /// Room left for newsletter blocks once the prompt template is counted.
    fn batch_budget(&self, plan: &CategoryPlan) -> usize {
        let overhead = prompt_builder::prompt_overhead(plan);
        if overhead >= self.max_batch_chars {
            warn!(
                max_batch_chars = self.max_batch_chars,
                overhead, "Prompt template alone exceeds the batch limit"
            );
        }
        self.max_batch_chars.saturating_sub(overhead)
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        items: &[ExtractedItem],
        plan: &CategoryPlan,
    ) -> Result<Vec<DigestSection>, DigestError> {
        let batches = batch::plan_batches(items, self.limits, self.batch_budget(plan));
        info!(
            items = items.len(),
            batches = batches.len(),
            model = %self.client.model_name(),
            "Summarizing newsletters"
        );

        let mut results = Vec::with_capacity(batches.len());
        for range in batches {
            let newsletters = prompt_builder::format_newsletters(&items[range], self.limits);
            let prompt = prompt_builder::build_prompt(&newsletters, plan);
            let text = self.client.complete(&prompt).await?;
            results.push(response::parse_response(&text, plan)?);
        }

        Ok(response::merge_sections(results, plan))
    }
}
