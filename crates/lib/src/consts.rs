/// Text shown in place of a value whose formula failed to evaluate.
pub const ERROR_SENTINEL: &str = "#ERROR";

/// Advisory wall-clock budget for a single script invocation.
pub const DEFAULT_SCRIPT_TIMEOUT_MS: u64 = 5_000;

/// Upper bound on memory a single Lua state may allocate.
pub const DEFAULT_SCRIPT_MEMORY_LIMIT: usize = 32 * 1024 * 1024;

/// Captured console output stops after this many lines or bytes.
pub const MAX_CONSOLE_LINES: usize = 1_000;
pub const MAX_CONSOLE_BYTES: usize = 1024 * 1024;

/// Appended once when console output was cut off.
pub const CONSOLE_TRUNCATED: &str = "[console output truncated]";

/// Name of the callable every script body must define.
pub const GENERATOR_FN: &str = "generate";

/// Chunk name reported in Lua error messages (`[string "script"]:3: ...`).
pub const SCRIPT_CHUNK_NAME: &str = "script";

pub const ENV_SCRIPT_TIMEOUT_MS: &str = "DECKSCRIPT_SCRIPT_TIMEOUT_MS";
pub const ENV_SCRIPT_MEMORY_LIMIT: &str = "DECKSCRIPT_SCRIPT_MEMORY_LIMIT";

/// Context variable names that entities and parameters can never claim.
pub const CONTEXT_NAMES: &[&str] = &["page_current", "page_total", "values", "params"];

/// Lua keywords; an entity named after one cannot be referenced from a script.
pub const LUA_KEYWORDS: &[&str] = &[
  "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in", "local", "nil",
  "not", "or", "repeat", "return", "then", "true", "until", "while",
];
