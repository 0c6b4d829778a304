//! Query answering as a fixed stage sequence.

use std::sync::Arc;
use std::time::Instant;

use ragline_index::HybridStore;
use ragline_protocols::{
    Answer, EmbeddingProvider, LanguageModel, Passage, PipelineError, RelevanceScorer,
    ServiceError,
};
use tracing::{info, warn};

/// Canonical refusal returned when validation rejects an answer or
/// synthesis is told the context is insufficient.
pub const UNKNOWN_ANSWER: &str = "I don't know";

const CONTEXT_DELIMITER: &str = "\n\n";

/// Pipeline tunables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Candidates requested from each index during hybrid search.
    pub retrieve_k: usize,
    /// Passages kept as synthesis context after reranking.
    pub top_n: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieve_k: 10,
            top_n: 4,
        }
    }
}

/// Answers a query in six strictly sequential stages: rewrite,
/// retrieve, rerank, select context, synthesize, validate.
///
/// The pipeline is stateless per request. It reads one store snapshot
/// during retrieval and holds no locks across external calls, so a
/// cancelled request simply drops its in-flight futures.
pub struct RetrievalPipeline {
    store: Arc<HybridStore>,
    llm: Arc<dyn LanguageModel>,
    embedding: Arc<dyn EmbeddingProvider>,
    scorer: Option<Arc<dyn RelevanceScorer>>,
    config: PipelineConfig,
}

impl RetrievalPipeline {
    pub fn new(
        store: Arc<HybridStore>,
        llm: Arc<dyn LanguageModel>,
        embedding: Arc<dyn EmbeddingProvider>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            llm,
            embedding,
            scorer: None,
            config,
        }
    }

    /// Attach a reranking scorer. Without one, retrieval order stands.
    pub fn with_scorer(mut self, scorer: Arc<dyn RelevanceScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Answer one query.
    ///
    /// Rewrite failures fall back to the raw query; failures in any
    /// later external call fail the request with the stage name
    /// attached.
    pub async fn answer(&self, query: &str) -> Result<Answer, PipelineError> {
        let request_start = Instant::now();
        info!(query_chars = query.chars().count(), "query received");

        let rewritten = self.rewrite(query).await;
        let candidates = self.retrieve(&rewritten).await?;
        let ranked = self.rerank(&rewritten, candidates).await?;
        let context = self.build_context(&ranked);
        let raw_answer = self.synthesize(query, &context).await?;
        let supported = self.validate(&context, &raw_answer).await?;

        let answer = if supported {
            Answer::supported(raw_answer)
        } else {
            warn!("answer rejected");
            Answer::unknown(UNKNOWN_ANSWER)
        };

        info!(
            supported = answer.supported,
            elapsed_ms = request_start.elapsed().as_millis() as u64,
            "request completed"
        );
        Ok(answer)
    }

    /// Ask the model for a cleaner phrasing of the query. Any failure
    /// keeps the raw query; this stage never fails the request.
    async fn rewrite(&self, query: &str) -> String {
        let start = Instant::now();
        let prompt = format!("Rewrite the question clearly: {query}");
        match self.llm.complete(&prompt).await {
            Ok(rewritten) if !rewritten.trim().is_empty() => {
                let rewritten = rewritten.trim().to_string();
                info!(
                    rewritten_chars = rewritten.chars().count(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "query rewritten"
                );
                rewritten
            }
            Ok(_) => {
                warn!("rewrite returned empty text, keeping the raw query");
                query.to_string()
            }
            Err(err) => {
                warn!(error = %err, "rewrite failed, keeping the raw query");
                query.to_string()
            }
        }
    }

    async fn retrieve(&self, query: &str) -> Result<Vec<Arc<Passage>>, PipelineError> {
        let start = Instant::now();
        let embedding = self
            .embedding
            .embed(query)
            .await
            .map_err(|e| PipelineError::service("query embedding", e))?;
        let passages = self
            .store
            .hybrid_search(query, &embedding, self.config.retrieve_k)?;
        info!(
            documents_retrieved = passages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "retrieval done"
        );
        Ok(passages)
    }

    /// Reorder candidates by scorer relevance, descending. Skipped
    /// when no scorer is attached or nothing was retrieved.
    async fn rerank(
        &self,
        query: &str,
        passages: Vec<Arc<Passage>>,
    ) -> Result<Vec<Arc<Passage>>, PipelineError> {
        let Some(scorer) = &self.scorer else {
            return Ok(passages);
        };
        if passages.is_empty() {
            return Ok(passages);
        }

        let start = Instant::now();
        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let scores = scorer
            .score(query, &texts)
            .await
            .map_err(|e| PipelineError::service("reranking", e))?;
        if scores.len() != passages.len() {
            return Err(PipelineError::service(
                "reranking",
                ServiceError::InvalidResponse(format!(
                    "scorer returned {} scores for {} passages",
                    scores.len(),
                    passages.len()
                )),
            ));
        }

        let mut scored: Vec<(f32, Arc<Passage>)> = scores.into_iter().zip(passages).collect();
        // Stable sort: equal scores keep retrieval order.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "reranking done"
        );
        Ok(scored.into_iter().map(|(_, passage)| passage).collect())
    }

    fn build_context(&self, passages: &[Arc<Passage>]) -> String {
        passages
            .iter()
            .take(self.config.top_n)
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DELIMITER)
    }

    /// Generate the answer from the assembled context and the original
    /// question, instructing the model to refuse when the context does
    /// not contain the answer.
    async fn synthesize(&self, question: &str, context: &str) -> Result<String, PipelineError> {
        let start = Instant::now();
        let prompt = format!(
            "Answer ONLY from the context.\n\
             If the answer is not in the context, say \"{UNKNOWN_ANSWER}\".\n\n\
             Context:\n{context}\n\n\
             Question:\n{question}\n\n\
             Answer:"
        );
        let answer = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::service("synthesis", e))?;
        let answer = answer.trim().to_string();
        info!(
            answer_chars = answer.chars().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "answer generated"
        );
        Ok(answer)
    }

    /// Ask the model whether the answer is grounded in the context.
    /// Returns false on any negative signal in the verdict.
    async fn validate(&self, context: &str, answer: &str) -> Result<bool, PipelineError> {
        let start = Instant::now();
        let prompt = format!(
            "Is the answer fully supported by the context? Answer yes or no.\n\n\
             Context:\n{context}\n\n\
             Answer:\n{answer}"
        );
        let verdict = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| PipelineError::service("validation", e))?;
        let supported = !has_negative_signal(&verdict);
        info!(
            supported,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "answer validated"
        );
        Ok(supported)
    }
}

/// True when the verdict contains a standalone negative token.
///
/// Matching whole tokens keeps words like "know" or "now" from reading
/// as rejections, while "No", "no." and "not supported" all do.
fn has_negative_signal(verdict: &str) -> bool {
    verdict
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token.eq_ignore_ascii_case("no") || token.eq_ignore_ascii_case("not"))
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
