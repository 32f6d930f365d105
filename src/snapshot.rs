// src/snapshot.rs

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Decryption error: {0}")]
    Decryption(String),
    #[error("Encryption error: {0}")]
    Encryption(String),
    #[error("Invalid master key: {0}")]
    KeyInvalid(String),
}

/// Ключ шифрования (32 байта = 256 бит)
pub type MasterKey = [u8; 32];

/// Разобрать мастер-ключ из hex-строки (64 символа)
pub fn parse_master_key(hex_str: &str) -> Result<MasterKey, SnapshotError> {
    let mut key = [0u8; 32];
    hex::decode_to_slice(hex_str.trim(), &mut key)
        .map_err(|e| SnapshotError::KeyInvalid(e.to_string()))?;
    Ok(key)
}

/// Зашифрованный снимок состояния на диске.
///
/// Формат файла: 12 байт nonce, затем AES-256-GCM шифротекст bincode-данных.
pub struct SnapshotFile {
    path: PathBuf,
    cipher: Aes256Gcm,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P, key: &MasterKey) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Прочитать снимок. Нет файла или он пуст: `None`.
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, SnapshotError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let mut file = OpenOptions::new().read(true).open(&self.path)?;
        let mut encrypted = Vec::new();
        file.read_to_end(&mut encrypted)?;

        if encrypted.is_empty() {
            return Ok(None);
        }
        if encrypted.len() < NONCE_LEN {
            return Err(SnapshotError::Decryption("File too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce_bytes),
                Payload { msg: ciphertext, aad: &[] },
            )
            .map_err(|_| SnapshotError::Decryption("AES-GCM decryption failed".to_string()))?;

        let value = bincode::deserialize(&plaintext)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        Ok(Some(value))
    }

    /// Записать снимок целиком (через временный файл и rename)
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), SnapshotError> {
        let plaintext =
            bincode::serialize(value).map_err(|e| SnapshotError::Serialization(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload { msg: &plaintext, aad: &[] },
            )
            .map_err(|_| SnapshotError::Encryption("AES-GCM encryption failed".to_string()))?;

        let tmp_path = self.path.with_extension("tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&nonce_bytes)?;
            file.write_all(&ciphertext)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}
