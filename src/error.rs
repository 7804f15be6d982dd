// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdgeLakeError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Object is missing required field: {0}")]
    MissingField(&'static str),
}

impl EdgeLakeError {
    /// True when the store rejected a write because the object changed underneath us
    pub fn is_conflict(&self) -> bool {
        self.api_code() == Some(409)
    }

    fn api_code(&self) -> Option<u16> {
        match self {
            EdgeLakeError::KubeError(kube::Error::Api(resp)) => Some(resp.code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EdgeLakeError>;
