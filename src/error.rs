//! Error types for flowdraft operations.
//!
//! Each module reports its own error type; [`FlowError`] wraps all of them
//! for callers, such as the command line tool, that handle every failure
//! the same way.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::graph::GraphError;
use crate::graph_parser::ParseWarning;
use crate::project::LoadError;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Parse(#[from] ParseWarning),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Config(#[from] ConfigError),
}
