pub mod address;
pub mod demo;
pub mod init;
pub mod inspect;
pub mod keygen;
pub mod open;
pub mod seal;
pub mod version;

pub use address::Address;
pub use demo::Demo;
pub use init::Init;
pub use inspect::Inspect;
pub use keygen::Keygen;
pub use open::Open;
pub use seal::Seal;
pub use version::Version;

use std::path::Path;

use common::envelope::{Envelope, EnvelopeError};

/// Read an envelope file written by `mseal seal`, either raw bytes or hex text
///
/// Text input that fails both ways reports the hex error, since hex is what
/// `mseal seal --hex` writes.
pub async fn read_envelope(path: &Path) -> Result<Envelope, ReadEnvelopeError> {
    let data = tokio::fs::read(path).await?;
    match Envelope::from_bytes(&data) {
        Ok(envelope) => Ok(envelope),
        Err(bytes_err) => match std::str::from_utf8(&data) {
            Ok(text) => Envelope::from_hex(text).map_err(|hex_err| {
                tracing::debug!(%bytes_err, %hex_err, "envelope is neither raw nor hex");
                ReadEnvelopeError::Envelope(hex_err)
            }),
            Err(_) => Err(ReadEnvelopeError::Envelope(bytes_err)),
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadEnvelopeError {
    #[error("failed to read envelope: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::op::{Op, OpContext};
    use common::crypto::KeyPair;
    use tempfile::TempDir;

    fn write_key(dir: &Path, pair: &KeyPair) -> std::path::PathBuf {
        let path = dir.join(format!("{}.pem", pair.address()));
        std::fs::write(&path, pair.secret().to_pem().as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_read_envelope_raw_and_hex() {
        let temp = TempDir::new().unwrap();
        let pair = KeyPair::generate();
        let envelope = Envelope::seal(b"file", &[*pair.public()]).unwrap();

        let raw = temp.path().join("raw.env");
        tokio::fs::write(&raw, envelope.to_bytes()).await.unwrap();
        assert_eq!(read_envelope(&raw).await.unwrap(), envelope);

        let hex = temp.path().join("hex.env");
        tokio::fs::write(&hex, format!("{}\n", envelope.to_hex())).await.unwrap();
        assert_eq!(read_envelope(&hex).await.unwrap(), envelope);

        let junk = temp.path().join("junk.env");
        tokio::fs::write(&junk, b"definitely not an envelope").await.unwrap();
        assert!(matches!(
            read_envelope(&junk).await,
            Err(ReadEnvelopeError::Envelope(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_hex_reports_hex_error() {
        let temp = TempDir::new().unwrap();
        let pair = KeyPair::generate();
        let envelope = Envelope::seal(b"file", &[*pair.public()]).unwrap();

        let bad_digit = temp.path().join("bad_digit.env");
        tokio::fs::write(&bad_digit, format!("0x{}zz", envelope.to_hex()))
            .await
            .unwrap();
        let err = read_envelope(&bad_digit).await.unwrap_err();
        assert!(err.to_string().contains("invalid hex"), "{}", err);

        let mut hex = envelope.to_hex();
        hex.truncate(hex.len() - 2);
        let short = temp.path().join("short.env");
        tokio::fs::write(&short, hex).await.unwrap();
        let err = read_envelope(&short).await.unwrap_err();
        assert!(err.to_string().contains("truncated recipients"), "{}", err);
    }

    #[tokio::test]
    async fn test_open_non_utf8_payload_is_verbatim() {
        let temp = TempDir::new().unwrap();
        let ctx = OpContext::new(Some(temp.path().join("state")));
        let pair = KeyPair::generate();
        let payload = vec![0xffu8, 0x00, 0xfe, 0x41];

        let input = temp.path().join("binary.bin");
        let sealed = temp.path().join("binary.env");
        tokio::fs::write(&input, &payload).await.unwrap();

        Seal {
            input,
            output: sealed.clone(),
            recipients: vec![*pair.public()],
            hex: false,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let opened = Open {
            input: sealed,
            key: Some(write_key(temp.path(), &pair)),
            identity: None,
            output: None,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let open::OpenOutput::Payload(bytes) = opened else {
            panic!("expected payload output, got {:?}", opened);
        };
        let mut stdout = Vec::new();
        open::write_payload(&mut stdout, &bytes).unwrap();
        assert_eq!(stdout, payload);
    }

    #[tokio::test]
    async fn test_seal_then_open_files() {
        let temp = TempDir::new().unwrap();
        let ctx = OpContext::new(Some(temp.path().join("state")));
        let pairs = KeyPair::generate_many(2);

        let input = temp.path().join("plain.txt");
        let sealed = temp.path().join("sealed.env");
        tokio::fs::write(&input, b"hello").await.unwrap();

        Seal {
            input: input.clone(),
            output: sealed.clone(),
            recipients: pairs.iter().map(|p| *p.public()).collect(),
            hex: true,
        }
        .execute(&ctx)
        .await
        .unwrap();

        for pair in &pairs {
            let opened = Open {
                input: sealed.clone(),
                key: Some(write_key(temp.path(), pair)),
                identity: None,
                output: None,
            }
            .execute(&ctx)
            .await
            .unwrap();
            assert_eq!(opened, open::OpenOutput::Payload(b"hello".to_vec()));
        }

        let outsider = KeyPair::generate();
        let result = Open {
            input: sealed.clone(),
            key: Some(write_key(temp.path(), &outsider)),
            identity: Some(pairs[0].address()),
            output: None,
        }
        .execute(&ctx)
        .await;
        assert!(matches!(
            result,
            Err(open::OpenError::Envelope(EnvelopeError::AuthenticationFailure))
        ));

        let report = Inspect { input: sealed }.execute(&ctx).await.unwrap();
        assert!(report.contains(&pairs[1].address().to_string()));
    }

    #[tokio::test]
    async fn test_open_with_state_key() {
        let temp = TempDir::new().unwrap();
        let ctx = OpContext::new(Some(temp.path().join("state")));
        let state = multiseal::AppState::init(ctx.config_path.clone(), None).unwrap();
        let key = state.load_key().unwrap();

        let sealed = temp.path().join("sealed.env");
        let envelope = Envelope::seal(b"for the state key", &[key.public()]).unwrap();
        tokio::fs::write(&sealed, envelope.to_bytes()).await.unwrap();

        let opened = Open {
            input: sealed,
            key: None,
            identity: None,
            output: None,
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(
            opened,
            open::OpenOutput::Payload(b"for the state key".to_vec())
        );
    }

    #[tokio::test]
    async fn test_demo_runs() {
        let temp = TempDir::new().unwrap();
        let ctx = OpContext::new(Some(temp.path().join("none")));
        let output = Demo { recipients: Some(2) }.execute(&ctx).await.unwrap();
        assert!(output.contains("Recipient 2 decrypted"));
    }
}
