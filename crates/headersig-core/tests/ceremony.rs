//! End-to-end sign and combine runs against an in-memory ledger

use assert_matches::assert_matches;
use headersig_core::{
    parse_height_roots, verify_signature, Aggregator, ArtifactEmitter, CombinedSignatureMap,
    EmitMode, HeaderSigError, JsonArtifactWriter, ParseMode, PayloadBuilder, SignatureSet,
    SignatureSetParser,
};
use headersig_testkit::{height_roots_arg, test_header, test_root, KeyTestFixture, MemoryLedger, CHAIN_ID};

fn signers(n: usize) -> Vec<KeyTestFixture> {
    (0..n)
        .map(|i| KeyTestFixture::from_seed_string(&format!("signer-{i}")))
        .collect()
}

async fn sign_output(ledger: MemoryLedger, heights: &[u64], signer: &KeyTestFixture) -> String {
    let pairs = parse_height_roots(&height_roots_arg(heights, test_root(0xaa))).unwrap();
    let mut out = Vec::new();
    ArtifactEmitter::new(ledger)
        .sign(&pairs, signer, &mut out)
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn parse_single(text: &str) -> SignatureSet {
    SignatureSetParser::new(ParseMode::SingleSigner, false)
        .parse(text)
        .unwrap()
}

#[tokio::test]
async fn sign_mode_prints_one_verifiable_line_per_height() {
    let signer = &signers(1)[0];
    let root_hex = "aa".repeat(32);
    let output = sign_output(MemoryLedger::with_heights(CHAIN_ID, [100]), &[100], signer).await;

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 1);
    let (height, sig_hex) = lines[0].split_once(':').unwrap();
    assert_eq!(height, "100");

    let mut expected = test_header(CHAIN_ID, 100);
    expected.cross_state_root = root_hex.parse().unwrap();
    let sig = hex::decode(sig_hex).unwrap();
    assert!(verify_signature(
        &signer.verifying_key(),
        expected.hash().as_bytes(),
        &sig
    ));
}

#[tokio::test]
async fn sign_mode_keeps_lines_written_before_a_failure() {
    let signer = &signers(1)[0];
    let ledger = MemoryLedger::with_heights(CHAIN_ID, [1, 2, 3]).fail_at(2);
    let pairs = parse_height_roots(&height_roots_arg(&[1, 2, 3], test_root(1))).unwrap();
    let mut out = Vec::new();

    let err = ArtifactEmitter::new(ledger)
        .sign(&pairs, signer, &mut out)
        .await
        .unwrap_err();

    assert_matches!(err, HeaderSigError::TransportError { .. });
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with("1:"));
}

#[tokio::test]
async fn payload_reports_unknown_height() {
    let builder = PayloadBuilder::new(MemoryLedger::with_heights(CHAIN_ID, [1]));
    let err = builder.build_payload(5, test_root(1)).await.unwrap_err();
    assert_matches!(err, HeaderSigError::HeaderNotFound { height: 5 });

    let err = builder
        .build_payload(u64::from(u32::MAX) + 1, test_root(1))
        .await
        .unwrap_err();
    assert_matches!(err, HeaderSigError::MalformedInput { .. });
}

#[tokio::test]
async fn payload_hash_is_deterministic_and_root_sensitive() {
    let builder = PayloadBuilder::new(MemoryLedger::with_heights(CHAIN_ID, [9]));
    let a = builder.build_payload(9, test_root(1)).await.unwrap();
    let b = builder.build_payload(9, test_root(1)).await.unwrap();
    let c = builder.build_payload(9, test_root(2)).await.unwrap();

    assert_eq!(a, b);
    assert_ne!(a.signing_hash, c.signing_hash);
    assert_eq!(a.header.cross_state_root, test_root(1));
    assert_eq!(builder.ledger().lookups(), vec![9, 9, 9]);
}

#[tokio::test]
async fn combine_mode_attaches_signatures_in_signer_order() {
    let keys = signers(2);
    let heights = [100, 200];
    let mut sets = Vec::new();
    for key in &keys {
        let text = sign_output(MemoryLedger::with_heights(CHAIN_ID, [100, 200]), &heights, key).await;
        sets.push(parse_single(&text));
    }
    let combined = Aggregator::default().combine(&sets).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headers.json");
    let writer = JsonArtifactWriter::new(&path);
    let verify_keys: Vec<_> = keys.iter().map(KeyTestFixture::verifying_key).collect();
    let pairs = parse_height_roots(&height_roots_arg(&heights, test_root(0xaa))).unwrap();

    let artifact = ArtifactEmitter::new(MemoryLedger::with_heights(CHAIN_ID, [100, 200]))
        .emit(
            &pairs,
            EmitMode::Combine {
                signatures: &combined,
                verify_keys: &verify_keys,
                writer: &writer,
            },
        )
        .await
        .unwrap()
        .unwrap();

    for height in heights {
        let header = artifact.get(height).unwrap();
        assert_eq!(header.sig_data.len(), 2);
        assert_eq!(header.cross_state_root, test_root(0xaa));
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(header.sig_data[i], sets[i].get(height).unwrap()[0]);
            assert!(verify_signature(&key.verifying_key(), header.hash().as_bytes(), &header.sig_data[i]));
        }
    }
    assert_eq!(headersig_core::read_artifact(&path).unwrap(), artifact);
}

#[tokio::test]
async fn combine_mode_two_signer_files_in_order() {
    let combined = Aggregator::default()
        .combine(&[parse_single("100:a1a1"), parse_single("100:b2b2")])
        .unwrap();
    let pairs = parse_height_roots(&height_roots_arg(&[100], test_root(0xaa))).unwrap();

    let artifact = ArtifactEmitter::new(MemoryLedger::with_heights(CHAIN_ID, [100]))
        .combine(&pairs, &combined, &[])
        .await
        .unwrap();

    assert_eq!(
        artifact.get(100).unwrap().sig_data,
        vec![vec![0xa1, 0xa1], vec![0xb2, 0xb2]]
    );
}

#[tokio::test]
async fn combine_mode_height_mismatch_writes_nothing() {
    let combined = CombinedSignatureMap::from(parse_single("100:aa\n201:bb"));
    let pairs = parse_height_roots(&height_roots_arg(&[100, 200], test_root(1))).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headers.json");
    let writer = JsonArtifactWriter::new(&path);

    let err = ArtifactEmitter::new(MemoryLedger::with_heights(CHAIN_ID, [100, 200, 201]))
        .emit(
            &pairs,
            EmitMode::Combine {
                signatures: &combined,
                verify_keys: &[],
                writer: &writer,
            },
        )
        .await
        .unwrap_err();

    assert_matches!(
        err,
        HeaderSigError::HeightMismatch {
            expected: 200,
            found: 201
        }
    );
    assert!(!path.exists());
}

#[tokio::test]
async fn combine_mode_rejects_length_mismatch_before_fetching() {
    let combined = CombinedSignatureMap::from(parse_single("100:aa"));
    let pairs = parse_height_roots(&height_roots_arg(&[100, 200], test_root(1))).unwrap();
    let emitter = ArtifactEmitter::new(MemoryLedger::with_heights(CHAIN_ID, [100, 200]));

    let err = emitter.combine(&pairs, &combined, &[]).await.unwrap_err();
    assert_matches!(
        err,
        HeaderSigError::LengthMismatch {
            roots: 2,
            signatures: 1
        }
    );
}

#[tokio::test]
async fn combine_mode_rejects_signature_from_wrong_key() {
    let keys = signers(2);
    let text = sign_output(MemoryLedger::with_heights(CHAIN_ID, [7]), &[7], &keys[0]).await;
    let combined = Aggregator::default()
        .combine(&[parse_single(&text), parse_single(&text)])
        .unwrap();
    let pairs = parse_height_roots(&height_roots_arg(&[7], test_root(0xaa))).unwrap();
    let verify_keys: Vec<_> = keys.iter().map(KeyTestFixture::verifying_key).collect();

    let err = ArtifactEmitter::new(MemoryLedger::with_heights(CHAIN_ID, [7]))
        .combine(&pairs, &combined, &verify_keys)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        HeaderSigError::InvalidSignature {
            height: 7,
            signer_index: 1
        }
    );
}
