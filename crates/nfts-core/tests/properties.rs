use nfts_canonical::schema::NFTS_SERIE_TRIMMED;
use nfts_canonical::{Canonicalizer, Element};
use nfts_core::{Reassembler, Signer, SigningMaterial, VerificationKey, Verifier};
use proptest::prelude::*;
use std::sync::OnceLock;

fn material() -> &'static SigningMaterial {
    static MATERIAL: OnceLock<SigningMaterial> = OnceLock::new();
    MATERIAL.get_or_init(|| {
        SigningMaterial::from_pem(
            include_str!("fixtures/signer_key.pem"),
            Some(include_bytes!("fixtures/signer_cert.pem").as_slice()),
        )
        .unwrap()
    })
}

const FIELDS: [&str; 8] = [
    "Tomador",
    "CodigoCEI",
    "TipoDocumento",
    "ValorServicos",
    "Extra",
    "Discriminacao",
    "ValorJuros",
    "ISSRetidoTomador",
];

fn unit_strategy() -> impl Strategy<Value = Element> {
    proptest::collection::vec((0..FIELDS.len(), "[ A-Za-z0-9,]{0,10}"), 0..12).prop_map(|fields| {
        let mut unit = Element::new("NFTS");
        unit.children = fields
            .into_iter()
            .map(|(i, text)| Element::with_text(FIELDS[i], text))
            .collect();
        unit
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn sign_then_verify_is_valid(unit in unit_strategy()) {
        let canonicalizer = Canonicalizer::new(&NFTS_SERIE_TRIMMED);
        let signer = Signer::new(material());
        let key = material().verification_key().unwrap();

        let mut signed = unit.clone();
        let signature = signer.sign(&canonicalizer.canonicalize(&unit).bytes).unwrap();
        Reassembler::new(&NFTS_SERIE_TRIMMED).reassemble(&mut signed, &signature.encoded);

        let verified = Verifier::new(canonicalizer, &key).verify_unit(&signed).unwrap();
        prop_assert!(verified.verdict.is_valid());
    }

    #[test]
    fn reassembly_orders_and_keeps_every_field(unit in unit_strategy()) {
        let schema = &NFTS_SERIE_TRIMMED;
        let mut signed = unit.clone();
        Reassembler::new(schema).reassemble(&mut signed, "eA==");

        prop_assert_eq!(signed.children.len(), unit.children.len() + 1);
        let positions: Vec<usize> = signed
            .children
            .iter()
            .map(|c| schema.record_position(c.local_name()).unwrap_or(usize::MAX))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    }
}
