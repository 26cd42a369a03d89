use crate::domain::catalog::{Franchise, MenuItem};
use crate::domain::session::User;
use crate::error::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUILTIN_STOREFRONT: &str = include_str!("../../../fixtures/storefront.json");

/// A user account together with the password the in-memory auth gate checks.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(flatten)]
    pub user: User,
    pub password: String,
}

/// Seed data for the in-memory collaborators: menu, franchises, and accounts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorefrontFixture {
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    #[serde(default)]
    pub franchises: Vec<Franchise>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

impl StorefrontFixture {
    /// The storefront bundled with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_reader(BUILTIN_STOREFRONT.as_bytes())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }
}
