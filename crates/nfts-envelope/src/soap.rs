use nfts_canonical::element::{escape_text, XML_DECLARATION};
use nfts_canonical::{parse_document, DocumentError, Element};
use thiserror::Error;

/// SOAP 1.1 envelope namespace.
pub const SOAP_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// Namespace of the municipal NFTS web service.
pub const NFTS_NAMESPACE: &str = "http://www.prefeitura.sp.gov.br/nfts";
/// Request element used when none is configured.
pub const DEFAULT_OPERATION: &str = "TesteEnvioLoteNFTSRequest";
/// `VersaoSchema` used when none is configured.
pub const DEFAULT_SCHEMA_VERSION: &str = "2";
/// Element that carries the signed document.
pub const MESSAGE_ELEMENT: &str = "MensagemXML";

/// Errors building or opening an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The operation is not a plain XML element name.
    #[error("invalid SOAP operation name '{0}'")]
    InvalidOperation(String),
    /// The carried message is not a readable document.
    #[error("invalid MensagemXML content: {0}")]
    Message(#[from] DocumentError),
}

/// SOAP request wrapping a signed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapEnvelope {
    operation: String,
    schema_version: String,
}

impl Default for SoapEnvelope {
    fn default() -> Self {
        Self {
            operation: DEFAULT_OPERATION.to_string(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }
}

impl SoapEnvelope {
    /// Envelope for a named operation and schema version.
    pub fn new(
        operation: impl Into<String>,
        schema_version: impl Into<String>,
    ) -> Result<Self, EnvelopeError> {
        let operation = operation.into();
        let valid = operation
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && operation
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(EnvelopeError::InvalidOperation(operation));
        }
        Ok(Self {
            operation,
            schema_version: schema_version.into(),
        })
    }

    /// Request element name.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Wraps a serialized document (declaration included) as CDATA.
    pub fn wrap(&self, document: &str) -> Vec<u8> {
        let mut version = String::new();
        escape_text(&self.schema_version, &mut version);

        let mut out = String::with_capacity(document.len() + 512);
        out.push_str(XML_DECLARATION);
        out.push_str(&format!("<soap:Envelope xmlns:soap=\"{SOAP_NAMESPACE}\">\n"));
        out.push_str("  <soap:Body>\n");
        out.push_str(&format!(
            "    <{} xmlns=\"{NFTS_NAMESPACE}\">\n",
            self.operation
        ));
        out.push_str(&format!("      <VersaoSchema>{version}</VersaoSchema>\n"));
        out.push_str(&format!("      <{MESSAGE_ELEMENT}>"));
        push_cdata(document, &mut out);
        out.push_str(&format!("</{MESSAGE_ELEMENT}>\n"));
        out.push_str(&format!("    </{}>\n", self.operation));
        out.push_str("  </soap:Body>\n");
        out.push_str("</soap:Envelope>\n");
        out.into_bytes()
    }
}

/// Writes `text` as CDATA, splitting any `]]>` across two sections.
fn push_cdata(text: &str, out: &mut String) {
    out.push_str("<![CDATA[");
    out.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}

/// Parses the document carried by a SOAP request, if `root` is one.
///
/// Returns `None` when no `MensagemXML` element exists.
pub fn unwrap_message(root: &Element) -> Option<Result<Element, EnvelopeError>> {
    let message = root.descendants_named(MESSAGE_ELEMENT).into_iter().next()?;
    Some(parse_document(message.text().trim_start().as_bytes()).map_err(EnvelopeError::from))
}
