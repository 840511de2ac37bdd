mod check_tests;
mod common;
mod formula_tests;
mod run_tests;
mod values_tests;
