use std::path::PathBuf;

use clap::Args;

use common::crypto::{Address as EthAddress, PublicKey};

/// Derive the address a public key (or the key in a PEM file) is known by
#[derive(Args, Debug, Clone)]
pub struct Address {
    /// Public key as hex: 65-byte uncompressed, 64-byte raw or 33-byte compressed
    #[arg(conflicts_with = "key", required_unless_present = "key")]
    pub public_key: Option<PublicKey>,

    /// PEM private key file to derive the address from
    #[arg(long)]
    pub key: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("no public key or key file given")]
    NoKey,
    #[error(transparent)]
    State(#[from] multiseal::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Address {
    type Error = AddressError;
    type Output = EthAddress;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let public_key = match (&self.public_key, &self.key) {
            (Some(public_key), _) => *public_key,
            (None, Some(path)) => multiseal::state::load_key_file(path)?.public(),
            (None, None) => return Err(AddressError::NoKey),
        };
        Ok(public_key.address())
    }
}
