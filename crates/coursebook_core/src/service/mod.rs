//! Catalog use-case services.
//!
//! # Responsibility
//! - Orchestrate mapper calls and unit-of-work batches into use cases.
//! - Own the caller-side referential bookkeeping the store does not enforce.

use crate::repo::RepoError;
use crate::uow::UowError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_service;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    Uow(UowError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Uow(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Uow(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<UowError> for ServiceError {
    fn from(value: UowError) -> Self {
        Self::Uow(value)
    }
}
