// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime error types

use placecell_generator::{ConfigurationError, GeneratorError, GeneratorId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("Unknown generator: {0}")]
    UnknownGenerator(GeneratorId),

    #[error("Invalid runtime setting '{setting}': {reason}")]
    InvalidSetting {
        setting: &'static str,
        reason: String,
    },
}

impl From<ConfigurationError> for RuntimeError {
    fn from(err: ConfigurationError) -> Self {
        RuntimeError::Generator(err.into())
    }
}

pub type Result<T> = core::result::Result<T, RuntimeError>;
