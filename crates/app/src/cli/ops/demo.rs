use std::fmt::Write;

use clap::Args;

use common::crypto::KeyPair;
use common::envelope::{Envelope, EnvelopeError};

const SAMPLE_TEXT: &str = "\
Encrypt once, open by any of N recipients!

The payload is encrypted a single time under a fresh AES-256-GCM key, and that
key is then wrapped separately for each recipient's secp256k1 public key.
Any one recipient can unwrap it with their private key and read the payload.";

/// Walk through a full seal and open with freshly generated recipients
#[derive(Args, Debug, Clone)]
pub struct Demo {
    /// Number of recipients (defaults to `demo_recipients` from config.toml)
    #[arg(long, short = 'n')]
    pub recipients: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("demo opened the wrong payload for recipient {0}")]
    Mismatch(usize),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Demo {
    type Error = DemoError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let count = self.recipients.unwrap_or_else(|| {
            ctx.state()
                .map(|state| state.config.demo_recipients)
                .unwrap_or_else(|_| multiseal::AppConfig::default().demo_recipients)
        });

        let mut out = String::new();
        let _ = writeln!(out, "Data:\n{}\n", SAMPLE_TEXT);

        let pairs = KeyPair::generate_many(count);
        for (idx, pair) in pairs.iter().enumerate() {
            let _ = writeln!(out, "Recipient {} address: {}", idx + 1, pair.address());
        }

        let publics: Vec<_> = pairs.iter().map(|pair| *pair.public()).collect();
        let envelope = Envelope::seal(SAMPLE_TEXT.as_bytes(), &publics)?;

        let _ = writeln!(out, "\nCiphertext:\n{}", hex::encode(envelope.ciphertext()));
        let _ = writeln!(out, "\nNonce: {}", envelope.nonce().to_hex());
        let _ = writeln!(out, "\nWrapped keys:");
        for (idx, recipient) in envelope.recipients().iter().enumerate() {
            let _ = writeln!(out, "Recipient {}: {}", idx + 1, recipient.share().to_hex());
        }

        let _ = write!(out, "\n--- Opening as each recipient ---");
        for (idx, pair) in pairs.iter().enumerate() {
            let plaintext = envelope.open(pair.secret(), &pair.address())?;
            if plaintext != SAMPLE_TEXT.as_bytes() {
                return Err(DemoError::Mismatch(idx + 1));
            }
            let _ = write!(
                out,
                "\n\nRecipient {} decrypted:\n{}",
                idx + 1,
                String::from_utf8_lossy(&plaintext)
            );
        }

        Ok(out)
    }
}
