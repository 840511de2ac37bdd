//! deckscript-lib: expression and scripting evaluation for slide decks.
//!
//! A project holds named values (plain numbers, text, or formulas over other
//! values) and Lua script assets placed on pages as instances.
//!
//! # Values
//!
//! Values resolve per page: a page override wins, otherwise `inherit` values
//! carry the last earlier override forward and `reset` values fall back to
//! their initial value. Formulas reference other values as `%{name}` and the
//! page counters as `%p` / `%P`.
//!
//! # Scripts
//!
//! Script instances run in a sandboxed Lua environment and return an SVG
//! fragment from `generate(params)`.

pub mod consts;
pub mod context;
pub mod formula;
pub mod project;
pub mod render;
pub mod resolve;
pub mod sandbox;

pub use context::{ExecutionContext, build_context};
pub use formula::{FormulaError, FormulaResult, evaluate_formula, try_evaluate_formula};
pub use project::{Project, ProjectError};
pub use render::render_instance;
pub use resolve::{ResolvedValue, Resolver, resolve};
pub use sandbox::{ExecutionResult, SandboxOptions, ScriptError, run};
