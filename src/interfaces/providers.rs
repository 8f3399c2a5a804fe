use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignResult {
    pub pk_b64: String,
    pub sig_b64: String,
    pub sign_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifyResult {
    pub ok: bool,
    pub verify_time_ms: f64,
}

impl VerifyResult {
    pub fn failed() -> Self {
        Self {
            ok: false,
            verify_time_ms: f64::NAN,
        }
    }
}

pub trait SignatureProvider: Send + Sync {
    fn sign(&self, algorithm: &str, message: &[u8]) -> Result<SignResult>;

    /// Infallible by contract: any internal failure is `VerifyResult::failed()`.
    fn verify(&self, algorithm: &str, message: &[u8], sig_b64: &str, pk_b64: &str)
        -> VerifyResult;
}
