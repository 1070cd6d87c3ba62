use nfts_canonical::{Element, SchemaDescriptor};
use serde::{Deserialize, Serialize};

/// What the reassembler changed in a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassemblyReport {
    /// An existing signature field was overwritten.
    pub replaced: bool,
    /// Extra signature fields that were removed.
    pub removed_duplicates: usize,
    /// Local names of children outside the full-record order, kept at the end.
    pub unordered: Vec<String>,
}

/// Writes a signature into a unit and restores full-record order.
#[derive(Debug, Clone, Copy)]
pub struct Reassembler {
    schema: &'static SchemaDescriptor,
}

impl Reassembler {
    /// Creates a reassembler for a descriptor.
    pub fn new(schema: &'static SchemaDescriptor) -> Self {
        Self { schema }
    }

    /// Inserts or replaces the signature field, then reorders the children.
    ///
    /// No child is dropped except surplus signature fields.
    pub fn reassemble(&self, unit: &mut Element, encoded: &str) -> ReassemblyReport {
        let field = self.schema.signature;
        let mut report = ReassemblyReport::default();

        let mut seen = false;
        unit.children.retain(|child| {
            if child.local_name() != field {
                return true;
            }
            if seen {
                report.removed_duplicates += 1;
                return false;
            }
            seen = true;
            true
        });

        match unit.find_child_mut(field) {
            Some(signature) => {
                signature.text = Some(encoded.to_string());
                signature.children.clear();
                report.replaced = true;
            }
            None => unit.children.push(Element::with_text(field, encoded)),
        }

        report.unordered = unit
            .children
            .iter()
            .filter(|child| self.schema.record_position(child.local_name()).is_none())
            .map(|child| child.local_name().to_string())
            .collect();
        unit.children.sort_by_key(|child| {
            self.schema
                .record_position(child.local_name())
                .unwrap_or(usize::MAX)
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nfts_canonical::parse_document;

    fn names(unit: &Element) -> Vec<&str> {
        unit.children.iter().map(Element::local_name).collect()
    }

    #[test]
    fn appends_signature_at_mandated_position() {
        let mut unit = parse_document(
            b"<NFTS><ValorMulta>1</ValorMulta><Tomador/><TipoDocumento>01</TipoDocumento></NFTS>",
        )
        .unwrap();
        let report = Reassembler::new(SchemaDescriptor::default_profile()).reassemble(&mut unit, "QUJD");
        assert_eq!(names(&unit), ["TipoDocumento", "Tomador", "Assinatura", "ValorMulta"]);
        assert!(!report.replaced);
        assert_eq!(unit.find_child("Assinatura").unwrap().text(), "QUJD");
    }

    #[test]
    fn replaces_first_signature_and_drops_the_rest() {
        let mut unit = parse_document(
            br#"<n:NFTS xmlns:n="urn:x"><n:Assinatura a="1">old</n:Assinatura><n:Assinatura>older</n:Assinatura></n:NFTS>"#,
        )
        .unwrap();
        let report = Reassembler::new(SchemaDescriptor::default_profile()).reassemble(&mut unit, "bmV3");
        assert!(report.replaced);
        assert_eq!(report.removed_duplicates, 1);
        assert_eq!(unit.children.len(), 1);
        assert_eq!(unit.children[0].name, "n:Assinatura");
        assert_eq!(unit.children[0].attributes, vec![("a".to_string(), "1".to_string())]);
        assert_eq!(unit.children[0].text(), "bmV3");
    }

    #[test]
    fn unknown_children_are_kept_after_ordered_ones() {
        let mut unit = parse_document(
            b"<NFTS><Extra>1</Extra><TipoNFTS>1</TipoNFTS><Outro/><TipoDocumento>02</TipoDocumento></NFTS>",
        )
        .unwrap();
        let report = Reassembler::new(SchemaDescriptor::default_profile()).reassemble(&mut unit, "eA==");
        assert_eq!(
            names(&unit),
            ["TipoDocumento", "TipoNFTS", "Assinatura", "Extra", "Outro"]
        );
        assert_eq!(report.unordered, vec!["Extra", "Outro"]);
    }
}
