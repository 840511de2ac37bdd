mod common;
mod formula_tests;
mod render_tests;
mod resolve_tests;
