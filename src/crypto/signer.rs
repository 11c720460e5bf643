//! ECDSA P-256 keypair management, canonical signing, and verification.
//!
//! On first use, generates a keypair and persists it: the private key
//! (PKCS#8 DER, PEM-wrapped) with owner-only read permission, the public
//! key (SubjectPublicKeyInfo DER, PEM-wrapped) world-readable. The
//! public-key fingerprint is the first 16 hex characters of SHA-256 over
//! the DER SPKI bytes.

use base64::{engine::general_purpose::STANDARD as base64_standard, Engine as _};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1, ECDSA_P256_SHA256_ASN1_SIGNING};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use crate::log_chain::to_hex;

/// Fixed DER prefix for a P-256 SubjectPublicKeyInfo, up to but not
/// including the 65-byte uncompressed EC point that `ring` hands back.
/// This is the standard `id-ecPublicKey`/`prime256v1` SPKI header.
const P256_SPKI_PREFIX: &[u8] = &[
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08,
    0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

pub struct Signer {
    key_pair: EcdsaKeyPair,
    public_key_der: Vec<u8>,
    fingerprint: String,
}

impl Signer {
    /// Load a keypair from `paths`, generating and persisting a fresh one
    /// if neither file exists yet.
    pub fn open_or_generate_at(paths: &KeyPaths) -> anyhow::Result<Self> {
        Self::open_or_generate(&paths.private_key, &paths.public_key)
    }

    /// Load a keypair from `private_key_path`/`public_key_path`, generating
    /// and persisting a fresh one if neither exists.
    pub fn open_or_generate(
        private_key_path: impl AsRef<Path>,
        public_key_path: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let private_key_path = private_key_path.as_ref();
        let public_key_path = public_key_path.as_ref();

        let pkcs8 = if private_key_path.exists() {
            Self::load_pkcs8(private_key_path)?
        } else {
            let generated = Self::generate_and_persist(private_key_path, public_key_path)?;
            return Ok(generated);
        };

        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .map_err(|e| anyhow::anyhow!("invalid stored keypair: {e}"))?;
        let public_key_der = Self::spki_der(key_pair.public_key().as_ref());
        let fingerprint = Self::fingerprint_of(&public_key_der);

        Ok(Self {
            key_pair,
            public_key_der,
            fingerprint,
        })
    }

    fn generate_and_persist(
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> anyhow::Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8_doc = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
            .map_err(|e| anyhow::anyhow!("keypair generation failed: {e}"))?;
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8_doc.as_ref(), &rng)
                .map_err(|e| anyhow::anyhow!("generated keypair rejected: {e}"))?;
        let public_key_der = Self::spki_der(key_pair.public_key().as_ref());
        let fingerprint = Self::fingerprint_of(&public_key_der);

        Self::persist_private_key(private_key_path, pkcs8_doc.as_ref())?;
        Self::persist_public_key(public_key_path, &public_key_der)?;

        Ok(Self {
            key_pair,
            public_key_der,
            fingerprint,
        })
    }

    fn spki_der(uncompressed_point: &[u8]) -> Vec<u8> {
        let mut der = Vec::with_capacity(P256_SPKI_PREFIX.len() + uncompressed_point.len());
        der.extend_from_slice(P256_SPKI_PREFIX);
        der.extend_from_slice(uncompressed_point);
        der
    }

    fn fingerprint_of(public_key_der: &[u8]) -> String {
        let hash = Sha256::digest(public_key_der);
        to_hex(&hash)[..16].to_string()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// Sign `bytes`, returning a base64-encoded ASN.1 DER signature.
    pub fn sign(&self, bytes: &[u8]) -> anyhow::Result<String> {
        let rng = SystemRandom::new();
        let signature = self
            .key_pair
            .sign(&rng, bytes)
            .map_err(|e| anyhow::anyhow!("signing failed: {e}"))?;
        Ok(base64_standard.encode(signature.as_ref()))
    }

    fn persist_private_key(path: &Path, pkcs8_der: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let pem = to_pem("PRIVATE KEY", pkcs8_der);
        fs::write(path, pem)?;
        set_owner_only(path)?;
        Ok(())
    }

    fn persist_public_key(path: &Path, spki_der: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let pem = to_pem("PUBLIC KEY", spki_der);
        fs::write(path, pem)?;
        set_world_readable(path)?;
        Ok(())
    }

    fn load_pkcs8(path: &Path) -> anyhow::Result<Vec<u8>> {
        let pem = fs::read_to_string(path)?;
        from_pem(&pem).ok_or_else(|| anyhow::anyhow!("malformed PEM at {}", path.display()))
    }
}

/// Standalone verifier: holds only a public key, not a signing capability.
/// Constructed from the bundled DER bytes in a certificate's trust-store
/// lookup, or directly from a loaded public-key PEM file.
pub struct PublicVerifier {
    public_key_der: Vec<u8>,
    fingerprint: String,
}

impl PublicVerifier {
    pub fn from_public_key_der(public_key_der: Vec<u8>) -> Self {
        let fingerprint = Signer::fingerprint_of(&public_key_der);
        Self {
            public_key_der,
            fingerprint,
        }
    }

    pub fn load_pem(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let pem = fs::read_to_string(path.as_ref())?;
        let der = from_pem(&pem)
            .ok_or_else(|| anyhow::anyhow!("malformed PEM at {}", path.as_ref().display()))?;
        Ok(Self::from_public_key_der(der))
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn verify(&self, bytes: &[u8], signature_b64: &str) -> bool {
        let Ok(signature) = base64_standard.decode(signature_b64) else {
            return false;
        };
        let public_key =
            ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &self.public_key_der);
        public_key.verify(bytes, &signature).is_ok()
    }
}

fn to_pem(label: &str, der: &[u8]) -> String {
    let body = base64_standard.encode(der);
    let mut out = format!("-----BEGIN {label}-----\n");
    for chunk in body.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(chunk).unwrap());
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out
}

fn from_pem(pem: &str) -> Option<Vec<u8>> {
    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();
    base64_standard.decode(body).ok()
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_world_readable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_world_readable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

/// Convenience bundle of the paths a `Signer` persists to.
#[derive(Debug, Clone)]
pub struct KeyPaths {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

impl KeyPaths {
    pub fn new(private_key: impl Into<PathBuf>, public_key: impl Into<PathBuf>) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: public_key.into(),
        }
    }
}
