//! Provision AWS ECR repositories and fetch registry credentials
//!
//! [`ecr::new_client`] resolves AWS configuration (region, profile and an
//! optional assumed role) into a [`ecr::Client`]. [`ecr::setup_repository`]
//! then makes sure a repository exists and returns its URI, and
//! [`ecr::RegistryClient::authorization_token`] yields `docker login`
//! credentials.

pub mod ecr;
pub mod settings;
