// Copyright (c) 2025 - Cowboy AI, Inc.
//! Text Interpreter boundary
//!
//! Free text → populated model. How resources are inferred from the text is
//! entirely the implementor's business; the service only checks that the
//! returned model is structurally valid.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::CanonicalModel;
use crate::errors::SyncResult;

/// What an interpreter produced from a piece of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub model: CanonicalModel,
    /// Human-readable account of what was understood
    pub description: String,
}

/// Natural-language interpreter collaborator
#[async_trait]
pub trait TextInterpreter: Send + Sync {
    /// Interpret `text` into a model
    ///
    /// Failures should be reported as [`SyncError::Interpreter`](crate::errors::SyncError::Interpreter).
    async fn interpret(&self, text: &str) -> SyncResult<Interpretation>;
}
