// Daily trivia generation: prompt building, response validation, orchestration.
// All LLM calls go through llm_client, never direct HTTP calls.

pub mod generator;
pub mod prompts;
pub mod validation;
