use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PqcBenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    MlDsa44,
    MlDsa65,
    MlDsa87,
    SphincsSha2_128sSimple,
    SphincsSha2_128fSimple,
    SphincsSha2_256fSimple,
}

impl SignatureAlgorithm {
    pub const ALL: [SignatureAlgorithm; 6] = [
        SignatureAlgorithm::MlDsa44,
        SignatureAlgorithm::MlDsa65,
        SignatureAlgorithm::MlDsa87,
        SignatureAlgorithm::SphincsSha2_128sSimple,
        SignatureAlgorithm::SphincsSha2_128fSimple,
        SignatureAlgorithm::SphincsSha2_256fSimple,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            SignatureAlgorithm::MlDsa44 => "ML-DSA-44",
            SignatureAlgorithm::MlDsa65 => "ML-DSA-65",
            SignatureAlgorithm::MlDsa87 => "ML-DSA-87",
            SignatureAlgorithm::SphincsSha2_128sSimple => "SPHINCS+-SHA2-128s-simple",
            SignatureAlgorithm::SphincsSha2_128fSimple => "SPHINCS+-SHA2-128f-simple",
            SignatureAlgorithm::SphincsSha2_256fSimple => "SPHINCS+-SHA2-256f-simple",
        }
    }

    pub fn family(&self) -> &'static str {
        algorithm_family(self.id())
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = PqcBenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SignatureAlgorithm::ALL
            .into_iter()
            .find(|alg| alg.id() == s.trim())
            .ok_or_else(|| PqcBenchError::Crypto(format!("unsupported algorithm: {s}")))
    }
}

pub fn algorithm_family(name: &str) -> &'static str {
    if name.starts_with("SPHINCS+") {
        "SPHINCS"
    } else if name.starts_with("ML-DSA") {
        "ML-DSA"
    } else {
        "OTHER"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmRun {
    pub name: String,
    pub messages: u32,
}

impl AlgorithmRun {
    pub fn new(name: &str, messages: u32) -> Self {
        Self {
            name: name.to_string(),
            messages,
        }
    }

    pub fn family(&self) -> &'static str {
        algorithm_family(&self.name)
    }
}

pub fn default_plan() -> Vec<AlgorithmRun> {
    vec![
        AlgorithmRun::new(SignatureAlgorithm::MlDsa65.id(), 100),
        AlgorithmRun::new(SignatureAlgorithm::SphincsSha2_128sSimple.id(), 100),
    ]
}
