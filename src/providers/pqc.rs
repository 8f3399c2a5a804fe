use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::domains::algorithm::SignatureAlgorithm;
use crate::error::Result;
use crate::interfaces::providers::{SignResult, SignatureProvider, VerifyResult};

macro_rules! pqc_scheme {
    ($name:ident, $($module:ident)::+) => {
        mod $name {
            use std::time::Instant;

            use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _};
            use $($module)::+::{
                detached_sign, keypair, verify_detached_signature, DetachedSignature, PublicKey,
            };

            pub fn sign(message: &[u8]) -> (Vec<u8>, Vec<u8>, f64) {
                let (pk, sk) = keypair();
                let start = Instant::now();
                let signature = detached_sign(message, &sk);
                let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
                (pk.as_bytes().to_vec(), signature.as_bytes().to_vec(), elapsed_ms)
            }

            pub fn verify(message: &[u8], signature: &[u8], public_key: &[u8]) -> Option<(bool, f64)> {
                let pk = PublicKey::from_bytes(public_key).ok()?;
                let signature = DetachedSignature::from_bytes(signature).ok()?;
                let start = Instant::now();
                let ok = verify_detached_signature(&signature, message, &pk).is_ok();
                Some((ok, start.elapsed().as_secs_f64() * 1000.0))
            }
        }
    };
}

pqc_scheme!(mldsa44, pqcrypto_mldsa::mldsa44);
pqc_scheme!(mldsa65, pqcrypto_mldsa::mldsa65);
pqc_scheme!(mldsa87, pqcrypto_mldsa::mldsa87);
pqc_scheme!(sphincs_sha2_128s, pqcrypto_sphincsplus::sphincssha2128ssimple);
pqc_scheme!(sphincs_sha2_128f, pqcrypto_sphincsplus::sphincssha2128fsimple);
pqc_scheme!(sphincs_sha2_256f, pqcrypto_sphincsplus::sphincssha2256fsimple);

type SignFn = fn(&[u8]) -> (Vec<u8>, Vec<u8>, f64);
type VerifyFn = fn(&[u8], &[u8], &[u8]) -> Option<(bool, f64)>;

fn scheme(algorithm: SignatureAlgorithm) -> (SignFn, VerifyFn) {
    match algorithm {
        SignatureAlgorithm::MlDsa44 => (mldsa44::sign, mldsa44::verify),
        SignatureAlgorithm::MlDsa65 => (mldsa65::sign, mldsa65::verify),
        SignatureAlgorithm::MlDsa87 => (mldsa87::sign, mldsa87::verify),
        SignatureAlgorithm::SphincsSha2_128sSimple => {
            (sphincs_sha2_128s::sign, sphincs_sha2_128s::verify)
        }
        SignatureAlgorithm::SphincsSha2_128fSimple => {
            (sphincs_sha2_128f::sign, sphincs_sha2_128f::verify)
        }
        SignatureAlgorithm::SphincsSha2_256fSimple => {
            (sphincs_sha2_256f::sign, sphincs_sha2_256f::verify)
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PqcProvider;

impl PqcProvider {
    pub fn new() -> Self {
        Self
    }
}

impl SignatureProvider for PqcProvider {
    fn sign(&self, algorithm: &str, message: &[u8]) -> Result<SignResult> {
        let algorithm: SignatureAlgorithm = algorithm.parse()?;
        let (sign, _) = scheme(algorithm);
        let (public_key, signature, sign_time_ms) = sign(message);
        Ok(SignResult {
            pk_b64: BASE64.encode(public_key),
            sig_b64: BASE64.encode(signature),
            sign_time_ms,
        })
    }

    fn verify(
        &self,
        algorithm: &str,
        message: &[u8],
        sig_b64: &str,
        pk_b64: &str,
    ) -> VerifyResult {
        let Ok(parsed) = algorithm.parse::<SignatureAlgorithm>() else {
            tracing::debug!(alg = algorithm, "verify requested for unknown algorithm");
            return VerifyResult::failed();
        };
        let (Ok(signature), Ok(public_key)) = (
            BASE64.decode(sig_b64.trim().as_bytes()),
            BASE64.decode(pk_b64.trim().as_bytes()),
        ) else {
            tracing::debug!(alg = algorithm, "signature or key is not valid base64");
            return VerifyResult::failed();
        };
        let (_, verify) = scheme(parsed);
        match verify(message, &signature, &public_key) {
            Some((ok, verify_time_ms)) => VerifyResult { ok, verify_time_ms },
            None => {
                tracing::debug!(alg = algorithm, "signature or key has the wrong length");
                VerifyResult::failed()
            }
        }
    }
}
