// Shared prompt fragments for retrieval-augmented calls.
// Task-specific prompts live next to the code that builds them.

/// System prompt for every generation call.
pub const RESUME_COACH_SYSTEM: &str = "You are a professional resume coach. \
    Base every finding on the resume excerpts you are given. \
    Do NOT invent experience, employers, dates, or credentials that are not in the excerpts.";

/// Wraps retrieved context around a question. Replace `{context}` and `{question}`.
pub const RETRIEVAL_QA_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Helpful Answer:";

/// Separator between retrieved units inside `{context}`.
pub const CONTEXT_SEPARATOR: &str = "\n\n";
