use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("Failed to decode transaction: {0}")]
    DecodeError(String),
    #[error("Failed to encode transaction: {0}")]
    EncodeError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Follower wallet: loads the keypair and signs venue transactions
pub struct WalletManager {
    keypair: Keypair,
}

// Manual impl: the derived Debug of `Keypair` would print secret key bytes.
impl std::fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.keypair.pubkey())
            .finish_non_exhaustive()
    }
}

impl WalletManager {
    /// Load keypair from a file path (JSON array format)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| WalletError::LoadError(format!("Failed to read file: {}", e)))?;

        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from a base58 encoded 64-byte secret
    pub fn from_base58(secret: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKeypair(format!("Invalid base58: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Create a new random keypair (for testing)
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// Get the public key as a string
    pub fn public_key(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Sign a versioned transaction in place.
    ///
    /// The signature goes into the slot matching this wallet's position among
    /// the static account keys, growing the signature list if it is short.
    /// Returns `false` and leaves the transaction untouched when this wallet
    /// is not one of its accounts.
    pub fn sign_versioned_transaction(&self, transaction: &mut VersionedTransaction) -> Result<bool, WalletError> {
        let pubkey = self.keypair.pubkey();
        let Some(index) = transaction
            .message
            .static_account_keys()
            .iter()
            .position(|key| *key == pubkey)
        else {
            return Ok(false);
        };

        let message = transaction.message.serialize();
        let signature = self
            .keypair
            .try_sign_message(&message)
            .map_err(|e| WalletError::SigningError(e.to_string()))?;

        if transaction.signatures.len() <= index {
            transaction.signatures.resize(index + 1, Signature::default());
        }
        transaction.signatures[index] = signature;
        Ok(true)
    }

    /// Decode, sign and re-encode a base64 transaction
    pub fn sign_encoded_transaction(&self, transaction_b64: &str) -> Result<(String, bool), WalletError> {
        let mut transaction = decode_transaction(transaction_b64)?;
        let signed = self.sign_versioned_transaction(&mut transaction)?;
        Ok((encode_transaction(&transaction)?, signed))
    }

    /// Sign a message and return the signature
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.keypair.sign_message(message)
    }

    /// Export keypair as bytes (use with caution)
    pub fn to_bytes(&self) -> Vec<u8> {
        self.keypair.to_bytes().to_vec()
    }
}

impl Clone for WalletManager {
    fn clone(&self) -> Self {
        Self {
            keypair: self.keypair.insecure_clone(),
        }
    }
}

/// Base64 + bincode -> versioned transaction
pub fn decode_transaction(transaction_b64: &str) -> Result<VersionedTransaction, WalletError> {
    let bytes = BASE64
        .decode(transaction_b64)
        .map_err(|e| WalletError::DecodeError(format!("Invalid base64: {}", e)))?;

    bincode::deserialize(&bytes)
        .map_err(|e| WalletError::DecodeError(format!("Invalid transaction bytes: {}", e)))
}

/// Versioned transaction -> bincode + base64
pub fn encode_transaction(transaction: &VersionedTransaction) -> Result<String, WalletError> {
    let bytes = bincode::serialize(transaction).map_err(|e| WalletError::EncodeError(e.to_string()))?;
    Ok(BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::message::{Message, VersionedMessage};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn unsigned_tx(payer: &Pubkey) -> VersionedTransaction {
        VersionedTransaction {
            signatures: vec![],
            message: VersionedMessage::Legacy(Message::new(&[], Some(payer))),
        }
    }

    #[test]
    fn test_new_random_wallet() {
        let wallet = WalletManager::new_random();
        let pubkey = wallet.public_key();
        assert!(!pubkey.is_empty());
        assert_eq!(pubkey, wallet.pubkey().to_string());
    }

    #[test]
    fn test_from_base58() {
        let wallet1 = WalletManager::new_random();
        let secret = bs58::encode(wallet1.to_bytes()).into_string();

        let wallet2 = WalletManager::from_base58(&secret).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());

        assert!(WalletManager::from_base58("0OIl").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let wallet1 = WalletManager::new_random();

        let json = serde_json::to_string(&wallet1.to_bytes()).unwrap();
        temp_file.write_all(json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let wallet2 = WalletManager::from_file(temp_file.path()).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_invalid_json_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"not valid json").unwrap();
        temp_file.flush().unwrap();

        assert!(WalletManager::from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_invalid_bytes() {
        assert!(WalletManager::from_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_clone_wallet() {
        let wallet1 = WalletManager::new_random();
        let wallet2 = wallet1.clone();
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_sign_fills_signer_slot() {
        let wallet = WalletManager::new_random();
        let mut tx = unsigned_tx(&wallet.pubkey());

        assert!(wallet.sign_versioned_transaction(&mut tx).unwrap());
        assert_eq!(tx.signatures.len(), 1);

        let message = tx.message.serialize();
        assert!(tx.signatures[0].verify(wallet.pubkey().as_ref(), &message));
    }

    #[test]
    fn test_sign_skips_foreign_transaction() {
        let wallet = WalletManager::new_random();
        let other = Pubkey::new_unique();
        let mut tx = unsigned_tx(&other);

        assert!(!wallet.sign_versioned_transaction(&mut tx).unwrap());
        assert!(tx.signatures.is_empty());
    }

    #[test]
    fn test_sign_encoded_transaction() {
        let wallet = WalletManager::new_random();
        let encoded = encode_transaction(&unsigned_tx(&wallet.pubkey())).unwrap();

        let (signed_b64, signed) = wallet.sign_encoded_transaction(&encoded).unwrap();
        assert!(signed);

        let decoded = decode_transaction(&signed_b64).unwrap();
        assert_eq!(decoded.signatures.len(), 1);
        assert_ne!(decoded.signatures[0], Signature::default());
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(decode_transaction("!!!"), Err(WalletError::DecodeError(_))));
        assert!(matches!(decode_transaction("AQID"), Err(WalletError::DecodeError(_))));
    }
}
