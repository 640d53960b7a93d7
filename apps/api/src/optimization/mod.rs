// Resume optimization: focus catalogue, prompts, and the RAG pipeline.
// All model calls go through llm_client; all vectors come from embedding.

pub mod focus;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
