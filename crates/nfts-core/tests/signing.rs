use nfts_canonical::schema::NFTS_SERIE_PADDED;
use nfts_canonical::{parse_document, Canonicalizer, Digest, Element};
use nfts_core::{
    record_units, sign_document, verify_document, CoreError, KeyError, Reassembler, Signature,
    Signer, SigningMaterial, UnitError, VerificationKey, VerificationVerdict, Verifier,
};

const LOTE: &[u8] = include_bytes!("fixtures/lote.xml");
const KEY: &str = include_str!("fixtures/signer_key.pem");
const KEY_PKCS1: &str = include_str!("fixtures/signer_key_pkcs1.pem");
const CERT: &[u8] = include_bytes!("fixtures/signer_cert.pem");
const CERT_DER: &[u8] = include_bytes!("fixtures/signer_cert.der");
const PUBLIC_KEY: &[u8] = include_bytes!("fixtures/signer_pub.pem");
const OTHER_KEY: &str = include_str!("fixtures/other_key.pem");
const OTHER_CERT: &[u8] = include_bytes!("fixtures/other_cert.pem");
const EC_KEY: &str = include_str!("fixtures/ec_key.pem");
const CANONICAL_UNIT_1: &[u8] = include_bytes!("fixtures/canonical_unit_1.bin");
const GOLDEN_SIGNATURE_UNIT_1: &str = include_str!("fixtures/golden_signature_unit_1.b64");

fn material() -> SigningMaterial {
    SigningMaterial::from_pem(KEY, Some(CERT)).unwrap()
}

fn signed_lote() -> Element {
    let mut root = parse_document(LOTE).unwrap();
    let material = material();
    let canonicalizer = Canonicalizer::new(&NFTS_SERIE_PADDED);
    let report = sign_document(
        &mut root,
        &canonicalizer,
        &Signer::new(&material),
        &Reassembler::new(&NFTS_SERIE_PADDED),
    )
    .unwrap();
    assert_eq!(report.signed(), 2);
    root
}

fn verify(root: &Element, key: &VerificationKey) -> nfts_core::VerificationReport {
    verify_document(root, &Verifier::new(Canonicalizer::default(), key)).unwrap()
}

#[test]
fn signature_matches_independent_implementation() {
    let material = material();
    let signature = Signer::new(&material).sign(CANONICAL_UNIT_1).unwrap();
    assert_eq!(signature.encoded, GOLDEN_SIGNATURE_UNIT_1.trim());
    assert_eq!(signature.raw.len(), 256);
}

#[test]
fn pkcs1_and_pkcs8_keys_sign_identically() {
    let pkcs1 = SigningMaterial::from_pem(KEY_PKCS1, None).unwrap();
    let signature = Signer::new(&pkcs1).sign(CANONICAL_UNIT_1).unwrap();
    assert_eq!(signature.encoded, GOLDEN_SIGNATURE_UNIT_1.trim());
}

#[test]
fn signing_embeds_signature_over_canonical_bytes() {
    let root = signed_lote();
    let units = record_units(&root, &Canonicalizer::default());
    let first = units[0].find_child("Assinatura").unwrap();
    assert_eq!(first.text(), GOLDEN_SIGNATURE_UNIT_1.trim());
}

#[test]
fn signing_reports_reassembly_per_unit() {
    let mut root = parse_document(LOTE).unwrap();
    let material = material();
    let report = sign_document(
        &mut root,
        &Canonicalizer::default(),
        &Signer::new(&material),
        &Reassembler::new(&NFTS_SERIE_PADDED),
    )
    .unwrap();

    let indices: Vec<usize> = report.units.iter().map(|u| u.index).collect();
    assert_eq!(indices, vec![1, 2]);
    let first = report.units[0].outcome.as_ref().unwrap();
    let second = report.units[1].outcome.as_ref().unwrap();
    assert!(!first.reassembly.replaced);
    assert!(second.reassembly.replaced);
    assert_eq!(first.canonical.bytes, CANONICAL_UNIT_1);
    assert_eq!(report.failed(), 0);
}

#[test]
fn signed_units_follow_full_record_order() {
    let root = signed_lote();
    let units = record_units(&root, &Canonicalizer::default());
    let names: Vec<&str> = units[0].children.iter().map(Element::local_name).collect();
    assert_eq!(
        names,
        [
            "TipoDocumento",
            "ChaveDocumento",
            "DataPrestacao",
            "StatusNFTS",
            "TributacaoNFTS",
            "ValorServicos",
            "ValorDeducoes",
            "CodigoServico",
            "CodigoSubItem",
            "AliquotaServicos",
            "ISSRetidoTomador",
            "ISSRetidoIntermediario",
            "Prestador",
            "RegimeTributacao",
            "DataPagamento",
            "Discriminacao",
            "TipoNFTS",
            "Tomador",
            "Assinatura",
            "ExigibilidadeSuspensa",
        ]
    );
    // Pruned fields survive in the full record.
    let endereco = units[0]
        .find_child("Prestador")
        .and_then(|p| p.find_child("Endereco"))
        .unwrap();
    assert!(endereco.find_child("ComplementoEndereco").is_some());
}

#[test]
fn round_trip_verifies_with_every_key_form() {
    let root = signed_lote();
    let reparsed = parse_document(&root.to_document_bytes()).unwrap();
    for key in [
        VerificationKey::from_pem(CERT).unwrap(),
        VerificationKey::from_der(CERT_DER).unwrap(),
        VerificationKey::from_pem(PUBLIC_KEY).unwrap(),
        material().verification_key().unwrap(),
    ] {
        let report = verify(&reparsed, &key);
        assert_eq!(report.valid(), 2, "{}", key.key_id);
        assert!(report.all_valid());
    }
}

#[test]
fn key_ids_identify_certificate_or_public_key() {
    let from_cert = VerificationKey::from_bytes(CERT).unwrap();
    let from_der = VerificationKey::from_bytes(CERT_DER).unwrap();
    assert_eq!(from_cert.key_id, from_der.key_id);
    assert_eq!(
        from_cert.key_id.fingerprint,
        Digest::sha256(CERT_DER),
    );
    assert!(from_cert
        .key_id
        .subject
        .as_deref()
        .unwrap()
        .contains("CN=TOMADOR EXEMPLO LTDA:12345678000195"));

    let from_spki = VerificationKey::from_pem(PUBLIC_KEY).unwrap();
    assert_eq!(from_spki.key_id.subject, None);
    assert_ne!(from_spki.key_id.fingerprint, from_cert.key_id.fingerprint);
}

#[test]
fn wrong_certificate_yields_invalid_with_diagnostics() {
    let root = signed_lote();
    let other = VerificationKey::from_pem(OTHER_CERT).unwrap();
    let report = verify(&root, &other);
    assert_eq!(report.invalid(), 2);

    let verified = report.units[0].outcome.as_ref().unwrap();
    let VerificationVerdict::Invalid(diagnostics) = &verified.verdict else {
        panic!("expected invalid verdict");
    };
    assert_eq!(
        diagnostics.canonical_digest.hex,
        "3b480478916950d6c07555aaf075d7033f71a769"
    );
    assert_eq!(diagnostics.canonical_len, CANONICAL_UNIT_1.len());
    assert_eq!(diagnostics.signature_len, 256);
    assert!(diagnostics
        .key_id
        .subject
        .as_deref()
        .unwrap()
        .contains("OUTRO EMISSOR"));

    let json = serde_json::to_value(&verified.verdict).unwrap();
    assert_eq!(json["verdict"], "Invalid");
    assert_eq!(json["diagnostics"]["canonical_digest"]["alg"], "sha-1");
    assert_eq!(json["diagnostics"]["signature_len"], 256);

    let err = verified.verdict.clone().ensure_valid().unwrap_err();
    assert!(matches!(err, UnitError::SignatureMismatch(_)));
    assert!(err.to_string().contains("3b480478916950d6c07555aaf075d7033f71a769"));
}

#[test]
fn unsigned_and_stale_units_are_isolated() {
    let root = parse_document(LOTE).unwrap();
    let key = VerificationKey::from_pem(CERT).unwrap();
    let report = verify(&root, &key);

    assert!(matches!(
        report.units[0].outcome,
        Err(UnitError::MissingSignature("Assinatura"))
    ));
    let stale = report.units[1].outcome.as_ref().unwrap();
    assert!(!stale.verdict.is_valid());
    assert_eq!(stale.signature.raw, b"stale signature");
    assert_eq!((report.valid(), report.invalid(), report.skipped()), (0, 1, 1));
}

#[test]
fn malformed_and_blank_signatures_are_skipped() {
    let mut root = signed_lote();
    let canonicalizer = Canonicalizer::default();
    let mut units = root.descendants_named_mut(canonicalizer.schema().unit);
    units[0].find_child_mut("Assinatura").unwrap().text = Some("not*base64".into());
    units[1].find_child_mut("Assinatura").unwrap().text = Some("  \n ".into());

    let report = verify(&root, &VerificationKey::from_pem(CERT).unwrap());
    assert!(matches!(
        report.units[0].outcome,
        Err(UnitError::MalformedSignature(_))
    ));
    assert!(matches!(
        report.units[1].outcome,
        Err(UnitError::MissingSignature(_))
    ));
    assert_eq!(report.skipped(), 2);
}

#[test]
fn wrapped_signature_text_still_verifies() {
    let mut root = signed_lote();
    let mut units = root.descendants_named_mut("NFTS");
    let field = units[0].find_child_mut("Assinatura").unwrap();
    let wrapped: String = field
        .text()
        .as_bytes()
        .chunks(64)
        .map(|line| format!("\n  {}", std::str::from_utf8(line).unwrap()))
        .collect();
    field.text = Some(wrapped);

    let report = verify(&root, &VerificationKey::from_pem(CERT).unwrap());
    assert!(report.all_valid());
}

#[test]
fn tampering_only_matters_inside_the_canonical_form() {
    let mut root = signed_lote();
    {
        let mut units = root.descendants_named_mut("NFTS");
        units[0].find_child_mut("ValorServicos").unwrap().text = Some("1500,51".into());
        units[1].children.push(Element::with_text("CodigoCEI", "123"));
        units[1].find_child_mut("ValorServicos").unwrap().text = Some(" 3,00 ".into());
    }
    let report = verify(&root, &VerificationKey::from_pem(CERT).unwrap());
    let verdicts: Vec<bool> = report
        .units
        .iter()
        .map(|u| u.outcome.as_ref().unwrap().verdict.is_valid())
        .collect();
    assert_eq!(verdicts, vec![false, true]);
}

#[test]
fn document_without_units_is_fatal() {
    let mut root = parse_document(b"<PedidoEnvioLoteNFTS><Cabecalho/></PedidoEnvioLoteNFTS>").unwrap();
    let material = material();
    let err = sign_document(
        &mut root,
        &Canonicalizer::default(),
        &Signer::new(&material),
        &Reassembler::new(&NFTS_SERIE_PADDED),
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::NoRecordUnits("NFTS")));

    let key = VerificationKey::from_pem(CERT).unwrap();
    let err = verify_document(&root, &Verifier::new(Canonicalizer::default(), &key)).unwrap_err();
    assert!(matches!(err, CoreError::NoRecordUnits(_)));
}

#[test]
fn non_rsa_and_mismatched_keys_are_rejected() {
    assert!(matches!(
        SigningMaterial::from_pem(EC_KEY, None),
        Err(KeyError::Mismatch(_))
    ));
    assert!(matches!(
        SigningMaterial::from_pem(OTHER_KEY, Some(CERT)),
        Err(KeyError::Mismatch(_))
    ));
    assert!(SigningMaterial::from_pem(OTHER_KEY, Some(OTHER_CERT)).is_ok());
}

#[test]
fn decoded_signature_round_trips_text() {
    let signature = Signature::decode(GOLDEN_SIGNATURE_UNIT_1).unwrap();
    assert_eq!(signature.raw.len(), 256);
    assert_eq!(Signature::from_raw(signature.raw).encoded, GOLDEN_SIGNATURE_UNIT_1.trim());
}
