use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{PqcBenchError, Result};
use crate::wire::xml::Element;

pub const PQC_NS: &str = "urn:uma:tfm:pqc:0";
pub const PQC_AUTH: &str = "pqc_auth";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEnvelope {
    pub algorithm: String,
    pub signature_b64: String,
    pub public_key_b64: String,
}

impl AuthEnvelope {
    pub fn new(algorithm: &str, signature_b64: &str, public_key_b64: &str) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            signature_b64: signature_b64.to_string(),
            public_key_b64: public_key_b64.to_string(),
        }
    }

    pub fn from_raw(algorithm: &str, signature: &[u8], public_key: &[u8]) -> Self {
        Self {
            algorithm: algorithm.to_string(),
            signature_b64: BASE64.encode(signature),
            public_key_b64: BASE64.encode(public_key),
        }
    }

    pub fn to_element(&self) -> Element {
        Element::new(PQC_AUTH, Some(PQC_NS))
            .with_attr("alg", &self.algorithm)
            .with_child(Element::new("sig", Some(PQC_NS)).with_text(&self.signature_b64))
            .with_child(Element::new("pk", Some(PQC_NS)).with_text(&self.public_key_b64))
    }

    pub fn from_element(element: Option<&Element>) -> Option<Self> {
        let element = element?;
        if !element.is(PQC_AUTH, PQC_NS) {
            return None;
        }

        let algorithm = element.attr("alg").map(str::trim).unwrap_or_default();
        let signature = element
            .get_child("sig", PQC_NS)
            .map(|el| el.text().trim())
            .unwrap_or_default();
        let public_key = element
            .get_child("pk", PQC_NS)
            .map(|el| el.text().trim())
            .unwrap_or_default();

        if algorithm.is_empty() || signature.is_empty() || public_key.is_empty() {
            tracing::warn!(
                alg = algorithm,
                has_sig = !signature.is_empty(),
                has_pk = !public_key.is_empty(),
                "incomplete pqc_auth element, treating message as unauthenticated"
            );
            return None;
        }

        Some(Self::new(algorithm, signature, public_key))
    }

    pub fn signature_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.signature_b64.as_bytes())
            .map_err(|e| PqcBenchError::Serialization(e.to_string()))
    }

    pub fn public_key_bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.public_key_b64.as_bytes())
            .map_err(|e| PqcBenchError::Serialization(e.to_string()))
    }

    pub fn signature_b64_len(&self) -> usize {
        self.signature_b64.len()
    }

    pub fn public_key_b64_len(&self) -> usize {
        self.public_key_b64.len()
    }
}
