use thiserror::Error;

/// All errors that can occur in Strongbox.
#[derive(Debug, Error)]
pub enum StrongboxError {
    // --- Input errors ---
    #[error("Invalid input: {0}")]
    Validation(String),

    // --- Lookup errors ---
    #[error("Not found: {0}")]
    NotFound(String),

    // --- Crypto errors ---
    #[error("Authentication failed — wrong password or tampered data")]
    Authentication,

    #[error("Integrity check failed: {0}")]
    Integrity(String),

    #[error("Cannot allocate key derivation memory: {0}")]
    Resource(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // --- Persisted format errors ---
    #[error("Corrupted data: {0}")]
    Corrupted(String),

    #[error("Unsupported format version {found} (this build supports up to {supported})")]
    Version { found: u32, supported: u32 },

    // --- Session errors ---
    #[error("Vault is locked — unlock it first")]
    Locked,

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

/// Convenience type alias for Strongbox results.
pub type Result<T> = std::result::Result<T, StrongboxError>;
