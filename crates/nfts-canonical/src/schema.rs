//! Static schema descriptors.
//!
//! A descriptor lists, in canonical order, the fields of a record unit that
//! take part in its signed form. Descriptors are `'static` data shared by
//! every canonicalization in the process.

use crate::identifiers::ProfileId;
use crate::normalize::NormalizationKind::{
    self, Boolean, CurrencyDecimal, FixedWidthSeries, NumericString, OptionalText, PlainDecimal,
    PlainText,
};
use crate::validation::ValidationError;

/// Profile used when none is configured.
pub const DEFAULT_PROFILE: &str = "nfts-tpnfts-serie-padded";

/// Leaf field of the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Local element name.
    pub name: &'static str,
    /// Normalization rule for the element text.
    pub kind: NormalizationKind,
}

/// Nested group of the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpec {
    /// Local element name.
    pub name: &'static str,
    /// Children in canonical order.
    pub children: &'static [SchemaEntry],
}

/// One entry of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaEntry {
    /// Leaf field.
    Field(FieldSpec),
    /// Nested group.
    Group(GroupSpec),
}

impl SchemaEntry {
    /// Local element name of the entry.
    pub fn name(&self) -> &'static str {
        match self {
            SchemaEntry::Field(field) => field.name,
            SchemaEntry::Group(group) => group.name,
        }
    }
}

const fn field(name: &'static str, kind: NormalizationKind) -> SchemaEntry {
    SchemaEntry::Field(FieldSpec { name, kind })
}

const fn group(name: &'static str, children: &'static [SchemaEntry]) -> SchemaEntry {
    SchemaEntry::Group(GroupSpec { name, children })
}

/// Immutable description of a record unit's canonical form.
#[derive(Debug, PartialEq, Eq)]
pub struct SchemaDescriptor {
    /// Profile identifier.
    pub profile: &'static str,
    /// Synthetic root tag of the canonical bytes.
    pub canonical_root: &'static str,
    /// Local name of record-unit elements.
    pub unit: &'static str,
    /// Local name of the signature field.
    pub signature: &'static str,
    /// Canonical entries in order.
    pub entries: &'static [SchemaEntry],
    /// Full-record order used when reassembling a signed unit.
    pub record_order: &'static [&'static str],
}

impl SchemaDescriptor {
    /// Profile identifier as a typed value.
    pub fn profile_id(&self) -> ProfileId {
        ProfileId::new(self.profile.to_string())
    }

    /// Every shipped descriptor.
    pub fn all() -> [&'static SchemaDescriptor; 2] {
        [&NFTS_SERIE_PADDED, &NFTS_SERIE_TRIMMED]
    }

    /// Looks up a shipped descriptor by profile id.
    pub fn for_profile(profile: &ProfileId) -> Result<&'static SchemaDescriptor, ValidationError> {
        Self::all()
            .into_iter()
            .find(|schema| schema.profile == profile.as_ref())
            .ok_or_else(|| ValidationError::UnknownProfile(profile.to_string()))
    }

    /// The descriptor used when no profile is configured.
    pub fn default_profile() -> &'static SchemaDescriptor {
        &NFTS_SERIE_PADDED
    }

    /// Position of a local name in the full-record order.
    pub fn record_position(&self, local: &str) -> Option<usize> {
        self.record_order.iter().position(|name| *name == local)
    }

    /// Number of leaf fields in the descriptor.
    pub fn field_count(&self) -> usize {
        fn count(entries: &[SchemaEntry]) -> usize {
            entries
                .iter()
                .map(|entry| match entry {
                    SchemaEntry::Field(_) => 1,
                    SchemaEntry::Group(group) => count(group.children),
                })
                .sum()
        }
        count(self.entries)
    }
}

/// Full element order of a record unit in the target XSD.
pub const RECORD_ORDER: &[&str] = &[
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
    "CodigoCEI",
    "MatriculaObra",
    "clocalPrestServ",
    "cPaisPrestServ",
    "ValorPIS",
    "ValorCOFINS",
    "ValorINSS",
    "ValorIR",
    "ValorCSLL",
    "ValorIPI",
    "RetornoComplementarIBSCBS",
    "ValorInicialCobrado",
    "ValorFinalCobrado",
    "ValorMulta",
    "ValorJuros",
    "ExigibilidadeSuspensa",
    "PagamentoParceladoAntecipado",
];

const TOMADOR: &[SchemaEntry] = &[
    group(
        "CPFCNPJ",
        &[field("CPF", PlainText), field("CNPJ", PlainText)],
    ),
    field("RazaoSocial", PlainText),
];

const PRESTADOR_CPFCNPJ: SchemaEntry = group(
    "CPFCNPJ",
    &[field("CNPJ", PlainText), field("CPF", PlainText)],
);

/// Profile whose `SerieNFTS` is padded to five characters.
pub static NFTS_SERIE_PADDED: SchemaDescriptor = SchemaDescriptor {
    profile: DEFAULT_PROFILE,
    canonical_root: "tpNFTS",
    unit: "NFTS",
    signature: "Assinatura",
    entries: &[
        field("TipoDocumento", PlainText),
        group(
            "ChaveDocumento",
            &[
                field("InscricaoMunicipal", PlainText),
                field("SerieNFTS", FixedWidthSeries),
                field("NumeroDocumento", NumericString),
            ],
        ),
        field("DataPrestacao", PlainText),
        field("StatusNFTS", PlainText),
        field("TributacaoNFTS", PlainText),
        field("ValorServicos", CurrencyDecimal),
        field("ValorDeducoes", CurrencyDecimal),
        field("CodigoServico", NumericString),
        field("CodigoSubItem", NumericString),
        field("AliquotaServicos", PlainDecimal),
        field("ISSRetidoTomador", Boolean),
        field("ISSRetidoIntermediario", Boolean),
        group(
            "Prestador",
            &[
                PRESTADOR_CPFCNPJ,
                field("InscricaoMunicipal", PlainText),
                field("RazaoSocialPrestador", PlainText),
                group(
                    "Endereco",
                    &[
                        field("TipoLogradouro", PlainText),
                        field("Logradouro", PlainText),
                        field("NumeroEndereco", PlainText),
                        field("ComplementoEndereco", OptionalText),
                        field("Bairro", PlainText),
                        field("Cidade", NumericString),
                        field("UF", PlainText),
                        field("CEP", PlainText),
                    ],
                ),
                field("Email", OptionalText),
            ],
        ),
        field("RegimeTributacao", NumericString),
        field("DataPagamento", OptionalText),
        field("Discriminacao", PlainText),
        field("TipoNFTS", NumericString),
        group("Tomador", TOMADOR),
    ],
    record_order: RECORD_ORDER,
};

/// Profile that keeps `SerieNFTS` as written and strips zeros from `CEP`.
pub static NFTS_SERIE_TRIMMED: SchemaDescriptor = SchemaDescriptor {
    profile: "nfts-tpnfts-serie-trimmed",
    canonical_root: "tpNFTS",
    unit: "NFTS",
    signature: "Assinatura",
    entries: &[
        field("TipoDocumento", PlainText),
        group(
            "ChaveDocumento",
            &[
                field("InscricaoMunicipal", PlainText),
                field("SerieNFTS", PlainText),
                field("NumeroDocumento", PlainText),
            ],
        ),
        field("DataPrestacao", PlainText),
        field("StatusNFTS", PlainText),
        field("TributacaoNFTS", PlainText),
        field("ValorServicos", CurrencyDecimal),
        field("ValorDeducoes", CurrencyDecimal),
        field("CodigoServico", NumericString),
        field("CodigoSubItem", NumericString),
        field("AliquotaServicos", PlainDecimal),
        field("ISSRetidoTomador", Boolean),
        field("ISSRetidoIntermediario", Boolean),
        group(
            "Prestador",
            &[
                PRESTADOR_CPFCNPJ,
                field("InscricaoMunicipal", PlainText),
                field("RazaoSocialPrestador", PlainText),
                group(
                    "Endereco",
                    &[
                        field("TipoLogradouro", PlainText),
                        field("Logradouro", PlainText),
                        field("NumeroEndereco", PlainText),
                        field("ComplementoEndereco", PlainText),
                        field("Bairro", PlainText),
                        field("Cidade", NumericString),
                        field("UF", PlainText),
                        field("CEP", NumericString),
                    ],
                ),
                field("Email", PlainText),
            ],
        ),
        field("RegimeTributacao", NumericString),
        field("DataPagamento", PlainText),
        field("Discriminacao", PlainText),
        field("TipoNFTS", NumericString),
        group("Tomador", TOMADOR),
    ],
    record_order: RECORD_ORDER,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_profile_resolves() {
        let id = ProfileId::parse(DEFAULT_PROFILE).unwrap();
        let schema = SchemaDescriptor::for_profile(&id).unwrap();
        assert_eq!(schema, SchemaDescriptor::default_profile());
        assert_eq!(schema.profile_id(), id);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let id = ProfileId::new("nfts-unknown-profile".to_string());
        let err = SchemaDescriptor::for_profile(&id).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownProfile(_)));
    }

    #[test]
    fn profiles_share_shape() {
        assert_eq!(NFTS_SERIE_PADDED.field_count(), 34);
        assert_eq!(NFTS_SERIE_TRIMMED.field_count(), 34);
    }

    #[test]
    fn canonical_top_level_follows_record_order() {
        for schema in SchemaDescriptor::all() {
            let positions: Vec<usize> = schema
                .entries
                .iter()
                .map(|entry| schema.record_position(entry.name()).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", schema.profile);
        }
    }

    #[test]
    fn record_order_has_no_duplicates() {
        let unique: HashSet<_> = RECORD_ORDER.iter().collect();
        assert_eq!(unique.len(), RECORD_ORDER.len());
        assert!(RECORD_ORDER.contains(&NFTS_SERIE_PADDED.signature));
    }

    #[test]
    fn profile_ids_are_valid() {
        for schema in SchemaDescriptor::all() {
            assert!(ProfileId::parse(schema.profile).is_ok());
        }
    }
}
