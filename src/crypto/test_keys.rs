use std::sync::LazyLock;

use rsa::RsaPrivateKey;

// 1024-bit keys keep generation fast in unoptimized test builds.
const TEST_RSA_BITS: usize = 1024;

static RSA_KEY_A: LazyLock<RsaPrivateKey> = LazyLock::new(generate_rsa_key);
static RSA_KEY_B: LazyLock<RsaPrivateKey> = LazyLock::new(generate_rsa_key);

fn generate_rsa_key() -> RsaPrivateKey {
    RsaPrivateKey::new(&mut rand::thread_rng(), TEST_RSA_BITS).expect("failed to generate RSA key")
}

pub(crate) fn rsa_key_a() -> &'static RsaPrivateKey {
    &RSA_KEY_A
}

pub(crate) fn rsa_key_b() -> &'static RsaPrivateKey {
    &RSA_KEY_B
}

pub(crate) fn ed25519_key(seed: u8) -> ed25519_dalek::SigningKey {
    ed25519_dalek::SigningKey::from_bytes(&[seed; 32])
}
