// Cross-cutting prompt fragments for LLM calls.
// Generation-specific prompt text lives in generation/prompts.rs.

/// System message sent with every completion request.
pub const JSON_ONLY_SYSTEM: &str = "You are a helpful assistant that strictly outputs JSON.";
