use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;

use common::crypto::KeyPair;

#[derive(Args, Debug, Clone)]
pub struct Keygen {
    /// Number of key pairs to generate
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,

    /// Write each private key to `<address>.pem` in this directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum KeygenError {
    #[error("count must be at least 1")]
    ZeroCount,
    #[error("failed to write key file: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Keygen {
    type Error = KeygenError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        if self.count == 0 {
            return Err(KeygenError::ZeroCount);
        }

        if let Some(dir) = &self.out_dir {
            tokio::fs::create_dir_all(dir).await?;
        }

        let mut output = String::new();
        for (idx, pair) in KeyPair::generate_many(self.count).iter().enumerate() {
            let address = pair.address();
            let _ = writeln!(output, "Key {}", idx + 1);
            let _ = writeln!(output, "  private: 0x{}", pair.secret().to_hex().as_str());
            let _ = writeln!(output, "  public:  {}", pair.public());
            let _ = writeln!(output, "  address: {}", address);

            if let Some(dir) = &self.out_dir {
                let path = dir.join(format!("{}.pem", address));
                tokio::fs::write(&path, pair.secret().to_pem().as_bytes()).await?;
                let _ = writeln!(output, "  written: {}", path.display());
            }
        }

        tracing::debug!(count = self.count, "generated key pairs");
        Ok(output.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::op::{Op, OpContext};
    use common::crypto::SecretKey;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_keygen_writes_loadable_keys() {
        let temp = TempDir::new().unwrap();
        let ctx = OpContext::new(Some(temp.path().join("state")));
        let out_dir = temp.path().join("keys");

        let output = Keygen {
            count: 3,
            out_dir: Some(out_dir.clone()),
        }
        .execute(&ctx)
        .await
        .unwrap();
        assert_eq!(output.matches("address: 0x").count(), 3);

        let mut entries = std::fs::read_dir(&out_dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect::<Vec<_>>();
        entries.sort();
        assert_eq!(entries.len(), 3);

        for path in entries {
            let key = multiseal::state::load_key_file(&path).unwrap();
            let address = key.public().address().to_string();
            assert_eq!(path.file_stem().unwrap().to_str().unwrap(), address);
            assert!(output.contains(&address));
        }
    }

    #[tokio::test]
    async fn test_keygen_private_hex_matches_address() {
        let temp = TempDir::new().unwrap();
        let ctx = OpContext::new(Some(temp.path().join("state")));
        let output = Keygen {
            count: 1,
            out_dir: None,
        }
        .execute(&ctx)
        .await
        .unwrap();

        let field = |name: &str| {
            output
                .lines()
                .find_map(|line| line.trim().strip_prefix(name))
                .unwrap()
                .trim()
                .to_string()
        };
        let key = SecretKey::from_hex(&field("private:")).unwrap();
        assert_eq!(key.public().to_string(), field("public:"));
        assert_eq!(key.public().address().to_string(), field("address:"));
    }

    #[tokio::test]
    async fn test_keygen_zero_count() {
        let ctx = OpContext::new(None);
        let result = Keygen {
            count: 0,
            out_dir: None,
        }
        .execute(&ctx)
        .await;
        assert!(matches!(result, Err(KeygenError::ZeroCount)));
    }
}
