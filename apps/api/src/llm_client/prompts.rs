// Cross-cutting prompt fragments shared by every service that calls the LLM.
// Service-specific prompts live next to the service.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Appended to extraction prompts so the model never fills gaps itself.
pub const NO_GUESSING_INSTRUCTION: &str = "\
    CRITICAL: Only report values that are stated in the input. \
    If a field is not mentioned, omit it from the JSON object entirely. \
    Never infer, guess, or invent a value.";
