use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair as SolanaKeypair;
use solana_sdk::signer::Signer;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[derive(Debug, Error)]
pub enum KeypairError {
    #[error("failed to read key file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write key file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("key file {0} already exists")]
    AlreadyExists(PathBuf),

    #[error("key file {path} is not a JSON byte array: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("malformed keypair bytes: {0}")]
    Malformed(String),
}

/// The wallet's signing key.
/// NEVER expose this struct's internals.
pub struct Keypair {
    inner: SolanaKeypair,
}

impl Keypair {
    /// Generates a fresh random keypair.
    pub fn new_random() -> Self {
        Self {
            inner: SolanaKeypair::new(),
        }
    }

    /// Rebuilds a keypair from the 64-byte secret||public layout Solana uses.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let inner =
            SolanaKeypair::try_from(bytes).map_err(|e| KeypairError::Malformed(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Loads a Solana CLI style key file (JSON array of 64 bytes).
    pub fn from_file(path: &Path) -> Result<Self, KeypairError> {
        let path = expand_home(path);
        let data = fs::read_to_string(&path).map_err(|source| KeypairError::Read {
            path: path.clone(),
            source,
        })?;
        let bytes: Vec<u8> =
            serde_json::from_str(&data).map_err(|source| KeypairError::Format { path, source })?;
        Self::from_bytes(&bytes)
    }

    /// Writes the keypair to a new file, refusing to replace an existing one.
    ///
    /// On unix the parent directory is created 0700 and the file 0600.
    pub fn write_new_file(&self, path: &Path) -> Result<PathBuf, KeypairError> {
        let path = expand_home(path);
        let write_err = |source| KeypairError::Write {
            path: path.clone(),
            source,
        };

        if path.exists() {
            return Err(KeypairError::AlreadyExists(path.clone()));
        }

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(write_err)?;

                #[cfg(unix)]
                {
                    let mut perms = fs::metadata(dir).map_err(write_err)?.permissions();
                    perms.set_mode(0o700);
                    fs::set_permissions(dir, perms).map_err(write_err)?;
                }
            }
        }

        let json = serde_json::to_string(&self.inner.to_bytes().to_vec())
            .map_err(|e| KeypairError::Malformed(e.to_string()))?;

        let mut f = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(write_err)?;

        #[cfg(unix)]
        {
            let mut perms = f.metadata().map_err(write_err)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&path, perms).map_err(write_err)?;
        }

        f.write_all(json.as_bytes()).map_err(write_err)?;
        Ok(path)
    }

    /// Returns the public key (safe to share).
    pub fn pubkey(&self) -> Pubkey {
        self.inner.pubkey()
    }

    /// Borrow the underlying Solana signer for transaction signing.
    pub fn solana_keypair(&self) -> &SolanaKeypair {
        &self.inner
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

/// `~/.config/solana/elusiv-demo/id.json`
pub fn default_keypair_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join(".config")
            .join("solana")
            .join("elusiv-demo")
            .join("id.json")
    })
}

/// Resolves a leading `~/` against the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_roundtrip_keeps_pubkey() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("id.json");

        let key = Keypair::new_random();
        let written = key.write_new_file(&path).unwrap();
        assert_eq!(written, path);

        let loaded = Keypair::from_file(&path).unwrap();
        assert_eq!(loaded.pubkey(), key.pubkey());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");

        Keypair::new_random().write_new_file(&path).unwrap();
        let err = Keypair::new_random().write_new_file(&path).unwrap_err();
        assert!(matches!(err, KeypairError::AlreadyExists(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_key_file_is_private() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        Keypair::new_random().write_new_file(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        fs::write(&path, "\"hello\"").unwrap();
        assert!(matches!(
            Keypair::from_file(&path),
            Err(KeypairError::Format { .. })
        ));

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            Keypair::from_file(&path),
            Err(KeypairError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Keypair::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, KeypairError::Read { .. }));
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        let p = Path::new("/tmp/id.json");
        assert_eq!(expand_home(p), p);
    }
}
