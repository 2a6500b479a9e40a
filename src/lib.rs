//! inkpress: markdown articles and CSS templates to inline-styled HTML that
//! restricted rich-text editors keep intact.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
