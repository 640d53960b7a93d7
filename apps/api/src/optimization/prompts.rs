// Prompt constants for the optimization pipeline.
// Shared retrieval fragments live in llm_client::prompts.

/// Resume coaching instruction. Replace: {job_title}, {job_description},
/// {focus_label}, {task}
pub const OPTIMIZATION_PROMPT_TEMPLATE: &str = "You are a professional resume coach.
Improve the resume for the job below.

Job Title: {job_title}
Job Description: {job_description}
Optimization Focus: {focus_label}

Task: {task}

Respond with:
## Key Findings
• Main matches and gaps

## Improvements
• 3–5 strong, actionable improvements

## Action Items
• 2–3 immediate next steps";
