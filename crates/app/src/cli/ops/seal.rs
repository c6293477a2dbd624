use std::path::PathBuf;

use clap::Args;

use common::crypto::PublicKey;
use common::envelope::{Envelope, EnvelopeError};

#[derive(Args, Debug, Clone)]
pub struct Seal {
    /// File to encrypt
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Where to write the envelope
    #[arg(long, short = 'o')]
    pub output: PathBuf,

    /// Recipient public key as hex (repeat for each recipient)
    #[arg(long = "recipient", short = 'r', required = true)]
    pub recipients: Vec<PublicKey>,

    /// Write the envelope as hex text instead of raw bytes
    #[arg(long)]
    pub hex: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Seal {
    type Error = SealError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let plaintext = tokio::fs::read(&self.input).await?;
        let envelope = Envelope::seal(&plaintext, &self.recipients)?;

        let encoded = if self.hex {
            envelope.to_hex().into_bytes()
        } else {
            envelope.to_bytes()
        };
        tokio::fs::write(&self.output, &encoded).await?;

        tracing::info!(
            input = %self.input.display(),
            output = %self.output.display(),
            recipients = envelope.recipients().len(),
            "sealed envelope"
        );

        let identities: Vec<String> = envelope.identities().map(|id| id.to_string()).collect();
        Ok(format!(
            "Sealed {} bytes for {} recipient(s) into {} ({} bytes)\n{}",
            plaintext.len(),
            identities.len(),
            self.output.display(),
            encoded.len(),
            identities.join("\n")
        ))
    }
}
