//! Use-case services over the linter and the baseline store.

pub mod lint_service;
