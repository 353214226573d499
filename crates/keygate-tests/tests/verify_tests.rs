//! Offline verification through the process-wide configuration.

use keygate_core::{Error, KeygenConfig, reset_config, set_config};
use keygate_licensing::{SchemeCode, verify};
use keygate_tests::{LICENSE_ID, LicenseFixture, MockKeygen, SigningFixture, init_test_logging};
use pretty_assertions::assert_eq;
use rand::Rng;

fn configure(public_key: Option<String>) {
    let mut config = KeygenConfig::new("https://api.keygen.sh", "v1", "1.7", "acct", "prod");
    config.public_key = public_key;
    set_config(config);
}

// One test owns the global configuration so parallel tests cannot race on it.
#[test]
fn test_global_verify() {
    init_test_logging();
    let signer = SigningFixture::new();
    let payload = r#"{"entitlements":["SSO"],"seats":25}"#;
    let signed = signer.sign(payload);

    reset_config();
    assert_eq!(verify(SchemeCode::Ed25519Sign, &signed).unwrap_err().tag(), "UnexpectedError");

    configure(None);
    assert_eq!(verify(SchemeCode::Ed25519Sign, &signed), Err(Error::PublicKeyMissing));

    configure(Some("not-hex".to_string()));
    assert_eq!(verify(SchemeCode::Ed25519Sign, &signed), Err(Error::PublicKeyInvalid));

    configure(Some(signer.public_key()));
    let first = verify(SchemeCode::Ed25519Sign, &signed);
    assert_eq!(first.as_deref(), Ok(payload));
    for _ in 0..10 {
        assert_eq!(verify(SchemeCode::Ed25519Sign, &signed), first);
    }

    assert_eq!(
        verify(SchemeCode::Ed25519Sign, "ABCD-EFGH-IJKL"),
        Err(Error::LicenseNotSigned)
    );

    reset_config();
}

#[test]
fn test_random_signature_corruption_is_rejected() {
    let signer = SigningFixture::new();
    let verifier = keygate_licensing::Verifier::new(Some(&signer.public_key())).unwrap();
    let signed = signer.sign("payload");
    let (signing_data, signature) = signed.split_once('.').unwrap();
    let mut rng = rand::thread_rng();

    for _ in 0..32 {
        let mut chars: Vec<char> = signature.chars().collect();
        let at = rng.gen_range(0..chars.len() - 1);
        chars[at] = if chars[at] == 'A' { 'B' } else { 'A' };
        let tampered = format!("{}.{}", signing_data, chars.into_iter().collect::<String>());

        assert_eq!(
            verifier.verify(SchemeCode::Ed25519Sign, &tampered),
            Err(Error::LicenseKeyNotGenuine),
            "position {}",
            at
        );
    }
}

#[tokio::test]
async fn test_validated_license_verifies_its_key() {
    init_test_logging();
    let signer = SigningFixture::new();
    let signed = signer.sign(r#"{"seats":3}"#);

    let keygen = MockKeygen::start().await;
    keygen
        .mock_validate(LicenseFixture::signed(&signed, "ED25519_SIGN"))
        .await;

    let client = keygate_licensing::KeygenClient::new(
        keygen
            .config()
            .with_license_key(signed.clone())
            .with_public_key(signer.public_key()),
    )
    .unwrap();
    let license = client.validate(&[], &[]).await.unwrap();

    assert_eq!(license.id, LICENSE_ID);
    assert_eq!(license.verify().unwrap(), r#"{"seats":3}"#);
}
