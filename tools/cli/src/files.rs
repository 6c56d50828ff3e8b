//! Keyfile reading and writing.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use keyshard_keystore::Keyfile;

/// Path of the share file with `index`: the pattern followed by the index
/// as two hex digits.
pub fn share_path(pattern: &str, index: u8) -> PathBuf {
    PathBuf::from(format!("{}{:02x}.json", pattern, index))
}

/// Write a keyfile readable only by its owner.
///
/// Refuses to replace an existing file.
pub fn write_keyfile(path: &Path, keyfile: &Keyfile) -> Result<()> {
    let bytes = keyfile.encode().context("Failed to encode keyfile")?;

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(&bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.sync_all()?;
    Ok(())
}

pub fn read_keyfile(path: &Path) -> Result<Keyfile> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Keyfile::decode(&bytes).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyshard_crypto::{Cipher, KdfKind, KdfStrength};
    use keyshard_keystore::{open, seal, KeystoreConfig};
    use tempfile::TempDir;

    fn keyfile() -> Keyfile {
        let config = KeystoreConfig::new(Cipher::Aes128Ctr, KdfKind::Pbkdf2, KdfStrength::Light);
        seal(&config, b"pw", b"file contents", "").unwrap()
    }

    #[test]
    fn test_share_path() {
        assert_eq!(share_path("share-", 0), PathBuf::from("share-00.json"));
        assert_eq!(share_path("out/key", 171), PathBuf::from("out/keyab.json"));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.json");
        let original = keyfile();

        write_keyfile(&path, &original).unwrap();
        let loaded = read_keyfile(&path).unwrap();

        assert_eq!(loaded, original);
        assert_eq!(open(&loaded, b"pw").unwrap().as_bytes(), b"file contents");
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.json");
        write_keyfile(&path, &keyfile()).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.json");
        write_keyfile(&path, &keyfile()).unwrap();

        assert!(write_keyfile(&path, &keyfile()).is_err());
    }

    #[test]
    fn test_read_garbage_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.json");
        fs::write(&path, b"{\"version\": 3}").unwrap();

        assert!(read_keyfile(&path).is_err());
        assert!(read_keyfile(&dir.path().join("missing.json")).is_err());
    }
}
