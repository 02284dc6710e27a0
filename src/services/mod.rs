//! Business logic services

pub mod auth;
pub mod catalog;
pub mod checkouts;
pub mod tokens;

use crate::{config::AuthConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub checkouts: checkouts::CheckoutsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository.
    ///
    /// Fails when the token signing secret is missing.
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> AppResult<Self> {
        let tokens = tokens::TokenService::new(auth_config)?;

        Ok(Self {
            auth: auth::AuthService::new(
                repository.clone(),
                tokens,
                auth_config.admin_invite_code.clone(),
            ),
            catalog: catalog::CatalogService::new(repository.clone()),
            checkouts: checkouts::CheckoutsService::new(repository.clone()),
            repository,
        })
    }
}
