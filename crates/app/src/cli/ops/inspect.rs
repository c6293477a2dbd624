use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;

use super::{read_envelope, ReadEnvelopeError};

/// Show what an envelope carries without decrypting it
#[derive(Args, Debug, Clone)]
pub struct Inspect {
    /// Envelope file, raw or hex
    #[arg(long, short = 'i')]
    pub input: PathBuf,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Inspect {
    type Error = ReadEnvelopeError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let envelope = read_envelope(&self.input).await?;

        let mut output = String::new();
        let _ = writeln!(output, "Suite: {}", common::crypto::SUITE);
        let _ = writeln!(output, "Nonce: {}", envelope.nonce().to_hex());
        let _ = writeln!(output, "Ciphertext: {} bytes", envelope.ciphertext().len());
        let _ = writeln!(output, "Encoded size: {} bytes", envelope.encoded_len());
        let _ = write!(output, "Recipients ({}):", envelope.recipients().len());
        for (idx, identity) in envelope.identities().enumerate() {
            let _ = write!(output, "\n  {}. {}", idx + 1, identity);
        }
        Ok(output)
    }
}
