use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use common::crypto::Address;
use common::envelope::EnvelopeError;

use super::{read_envelope, ReadEnvelopeError};

#[derive(Args, Debug, Clone)]
pub struct Open {
    /// Envelope file, raw or hex
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// PEM private key to open with (defaults to the state key)
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Identity to open as (defaults to the key's own address)
    #[arg(long = "as")]
    pub identity: Option<Address>,

    /// Write the payload here instead of printing it
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    State(#[from] multiseal::StateError),
    #[error(transparent)]
    Read(#[from] ReadEnvelopeError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("failed to write payload: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of opening an envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutput {
    /// Payload went to `--output`; carries the summary line
    Written(String),
    /// Payload bytes for stdout, exactly as sealed
    Payload(Vec<u8>),
}

impl fmt::Display for OpenOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenOutput::Written(summary) => f.write_str(summary),
            OpenOutput::Payload(bytes) => f.write_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

/// Write a payload verbatim: no re-encoding, no trailing newline
pub fn write_payload<W: Write>(out: &mut W, payload: &[u8]) -> std::io::Result<()> {
    out.write_all(payload)?;
    out.flush()
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Open {
    type Error = OpenError;
    type Output = OpenOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let secret_key = match &self.key {
            Some(path) => multiseal::state::load_key_file(path)?,
            None => ctx.state()?.load_key()?,
        };
        let identity = self
            .identity
            .unwrap_or_else(|| secret_key.public().address());

        let envelope = read_envelope(&self.input).await?;
        let plaintext = envelope.open(&secret_key, &identity)?;

        tracing::info!(%identity, input = %self.input.display(), "opened envelope");

        match &self.output {
            Some(path) => {
                tokio::fs::write(path, &plaintext).await?;
                Ok(OpenOutput::Written(format!(
                    "Opened {} bytes as {} into {}",
                    plaintext.len(),
                    identity,
                    path.display()
                )))
            }
            None => Ok(OpenOutput::Payload(plaintext)),
        }
    }
}
