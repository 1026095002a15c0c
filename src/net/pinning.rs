//! Certificate and public-key pinning.
//!
//! Pinning is active only when **both** hashes are configured. Hashes are SHA-256
//! digests written as hex; colons and whitespace are ignored and case does not
//! matter, so `AB:CD:...` and `abcd...` are the same pin.
//!
//! - The certificate hash covers the full DER encoding of the leaf certificate.
//! - The public-key hash covers the DER `SubjectPublicKeyInfo` of that certificate.
//!
//! The check runs inside the TLS handshake through [`PinnedCertVerifier`], after the
//! regular WebPKI chain validation. A peer that fails it never sees a request byte.

use std::fmt;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use sha2::{Digest, Sha256};

use crate::errors::NetError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinningHashes {
    pub certificate_hash: Option<String>,
    pub public_key_hash: Option<String>,
}

impl PinningHashes {
    pub fn new(certificate_hash: Option<String>, public_key_hash: Option<String>) -> Self {
        Self {
            certificate_hash: certificate_hash.map(|h| normalize_hash(&h)).filter(|h| !h.is_empty()),
            public_key_hash: public_key_hash.map(|h| normalize_hash(&h)).filter(|h| !h.is_empty()),
        }
    }

    /// Both hashes set, pinning enforced.
    pub fn is_complete(&self) -> bool {
        self.certificate_hash.is_some() && self.public_key_hash.is_some()
    }

    /// Returns `self` when pinning should be enforced.
    pub fn complete(self) -> Option<Self> {
        self.is_complete().then_some(self)
    }

    /// Checks the leaf certificate the server presented.
    ///
    /// `None` means no certificate was presented at all (plain HTTP), which fails.
    pub fn verify(&self, peer_certificate: Option<&[u8]>) -> Result<(), NetError> {
        let der = peer_certificate
            .ok_or_else(|| NetError::PinningMismatch("server presented no certificate".into()))?;

        if let Some(expected) = &self.certificate_hash {
            let actual = sha256_hex(der);
            if &actual != expected {
                return Err(NetError::PinningMismatch(format!(
                    "certificate hash {actual} does not match the pinned hash"
                )));
            }
        }

        if let Some(expected) = &self.public_key_hash {
            let spki = subject_public_key_info(der)
                .ok_or_else(|| NetError::PinningMismatch("cannot read public key from certificate".into()))?;
            let actual = sha256_hex(spki);
            if &actual != expected {
                return Err(NetError::PinningMismatch(format!(
                    "public key hash {actual} does not match the pinned hash"
                )));
            }
        }

        Ok(())
    }
}

/// Validates the chain with `inner`, then checks the leaf against the pins.
pub struct PinnedCertVerifier {
    inner: Arc<dyn ServerCertVerifier>,
    pins: PinningHashes,
}

impl PinnedCertVerifier {
    pub fn new(inner: Arc<dyn ServerCertVerifier>, pins: PinningHashes) -> Self {
        Self { inner, pins }
    }
}

impl fmt::Debug for PinnedCertVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinnedCertVerifier").field("pins", &self.pins).finish()
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verified = self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)?;

        match self.pins.verify(Some(end_entity.as_ref())) {
            Ok(()) => Ok(verified),
            Err(NetError::PinningMismatch(reason)) => Err(rustls::Error::General(reason)),
            Err(e) => Err(rustls::Error::General(e.to_string())),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// TLS client config that trusts the webpki roots and enforces `pins` on every handshake.
pub fn pinned_tls_config(pins: PinningHashes) -> Result<rustls::ClientConfig, NetError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .map_err(|e| NetError::Transport(format!("cannot build certificate verifier: {e}")))?;

    tls_config_with_verifier(provider, Arc::new(PinnedCertVerifier::new(webpki, pins)))
}

fn tls_config_with_verifier(
    provider: Arc<CryptoProvider>,
    verifier: Arc<dyn ServerCertVerifier>,
) -> Result<rustls::ClientConfig, NetError> {
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| NetError::Transport(format!("cannot build TLS config: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    Ok(config)
}

pub fn normalize_hash(hash: &str) -> String {
    hash.chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
}

// ---------- Minimal DER walking ----------

const TAG_SEQUENCE: u8 = 0x30;
const TAG_EXPLICIT_VERSION: u8 = 0xa0;

/// One DER element: tag, contents, the whole encoded element, and what follows it.
struct Tlv<'a> {
    tag: u8,
    contents: &'a [u8],
    encoded: &'a [u8],
    rest: &'a [u8],
}

fn read_tlv(input: &[u8]) -> Option<Tlv<'_>> {
    let (&tag, after_tag) = input.split_first()?;
    let (&first, mut after_len) = after_tag.split_first()?;

    let len = if first < 0x80 {
        first as usize
    } else {
        let count = (first & 0x7f) as usize;
        if count == 0 || count > 4 || after_len.len() < count {
            return None;
        }
        let len = after_len[..count].iter().fold(0usize, |acc, b| (acc << 8) | *b as usize);
        after_len = &after_len[count..];
        len
    };

    if after_len.len() < len {
        return None;
    }
    let header_len = input.len() - after_len.len();

    Some(Tlv {
        tag,
        contents: &after_len[..len],
        encoded: &input[..header_len + len],
        rest: &after_len[len..],
    })
}

/// Extracts the encoded `SubjectPublicKeyInfo` from an X.509 certificate.
///
/// `tbsCertificate` fields before it: optional `[0]` version, serial number,
/// signature algorithm, issuer, validity and subject.
pub fn subject_public_key_info(der: &[u8]) -> Option<&[u8]> {
    let cert = read_tlv(der).filter(|t| t.tag == TAG_SEQUENCE)?;
    let tbs = read_tlv(cert.contents).filter(|t| t.tag == TAG_SEQUENCE)?;

    let mut field = read_tlv(tbs.contents)?;
    if field.tag == TAG_EXPLICIT_VERSION {
        field = read_tlv(field.rest)?;
    }
    // field is the serial number, skip it plus the next four
    for _ in 0..5 {
        field = read_tlv(field.rest)?;
    }

    (field.tag == TAG_SEQUENCE).then_some(field.encoded)
}
