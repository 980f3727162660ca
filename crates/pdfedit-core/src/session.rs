//! Engine session for a single PDF document
//!
//! `LogSession` owns the document bytes and the authoritative operation
//! log. Writing operations into PDF content is left to an [`Exporter`].

use crate::error::PdfEditError;
use crate::operations::{
    ActionDelta, ActionKind, EditOperation, OpId, OperationLog, PdfRect, StyledTextSegment,
    TextStyle,
};
use lopdf::{Dictionary, Document, Object};

/// Produces final PDF bytes from the original document and the live operations.
pub trait Exporter {
    fn export(&self, document: &[u8], operations: &[EditOperation])
        -> Result<Vec<u8>, PdfEditError>;
}

impl<F> Exporter for F
where
    F: Fn(&[u8], &[EditOperation]) -> Result<Vec<u8>, PdfEditError>,
{
    fn export(
        &self,
        document: &[u8],
        operations: &[EditOperation],
    ) -> Result<Vec<u8>, PdfEditError> {
        self(document, operations)
    }
}

/// Session for editing a single PDF document
pub struct LogSession {
    document_bytes: Vec<u8>,
    document_name: String,
    page_count: u32,
    operations: OperationLog,
    is_signed: bool,
    exporter: Option<Box<dyn Exporter>>,
}

impl std::fmt::Debug for LogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSession")
            .field("document_name", &self.document_name)
            .field("page_count", &self.page_count)
            .field("is_signed", &self.is_signed)
            .field("operations", &self.operations.operations().len())
            .finish()
    }
}

impl LogSession {
    /// Create a new edit session with the given PDF
    pub fn new(name: &str, bytes: &[u8]) -> Result<Self, PdfEditError> {
        let doc =
            Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
        let page_count = doc.get_pages().len() as u32;
        let is_signed = document_has_signatures(&doc);

        tracing::info!(name, page_count, is_signed, "edit session opened");

        Ok(Self {
            document_bytes: bytes.to_vec(),
            document_name: name.to_string(),
            page_count,
            operations: OperationLog::new(),
            is_signed,
            exporter: None,
        })
    }

    /// Attach the component that turns operations into PDF bytes.
    pub fn with_exporter(mut self, exporter: impl Exporter + 'static) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    pub fn is_signed(&self) -> bool {
        self.is_signed
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    pub fn document_bytes(&self) -> &[u8] {
        &self.document_bytes
    }

    pub fn log(&self) -> &OperationLog {
        &self.operations
    }

    pub fn add_white_rect(
        &mut self,
        page: u32,
        rect: PdfRect,
        color: &str,
    ) -> Result<OpId, PdfEditError> {
        self.check_page(page)?;
        check_rect(&rect)?;
        Ok(self.operations.add(EditOperation::AddWhiteRect {
            id: 0,
            page,
            rect,
            color: color.to_string(),
        }))
    }

    pub fn add_text(
        &mut self,
        page: u32,
        rect: PdfRect,
        text: &str,
        style: TextStyle,
    ) -> Result<OpId, PdfEditError> {
        self.check_page(page)?;
        check_rect(&rect)?;
        Ok(self.operations.add(EditOperation::AddText {
            id: 0,
            page,
            rect,
            text: text.to_string(),
            style,
        }))
    }

    /// Add styled text with mixed formatting.
    /// segments_json: `[{"text":"BOLD","is_bold":true,"is_italic":false},...]`
    pub fn add_styled_text(
        &mut self,
        page: u32,
        rect: PdfRect,
        segments_json: &str,
        style: TextStyle,
    ) -> Result<OpId, PdfEditError> {
        let segments: Vec<StyledTextSegment> = serde_json::from_str(segments_json)
            .map_err(|e| PdfEditError::InvalidSegments(e.to_string()))?;
        self.add_segments(page, rect, segments, style)
    }

    pub fn add_segments(
        &mut self,
        page: u32,
        rect: PdfRect,
        segments: Vec<StyledTextSegment>,
        style: TextStyle,
    ) -> Result<OpId, PdfEditError> {
        self.check_page(page)?;
        check_rect(&rect)?;
        if segments.is_empty() {
            return Err(PdfEditError::InvalidSegments(
                "At least one segment is required".to_string(),
            ));
        }
        // Segments carry their own flags
        let style = TextStyle {
            is_bold: false,
            is_italic: false,
            ..style
        };
        Ok(self.operations.add(EditOperation::AddStyledText {
            id: 0,
            page,
            rect,
            segments,
            style,
        }))
    }

    /// Replace text at a position (cover original + overlay new text)
    pub fn replace_text(
        &mut self,
        page: u32,
        original_rect: PdfRect,
        replacement_rect: PdfRect,
        original_text: &str,
        new_text: &str,
        style: TextStyle,
    ) -> Result<OpId, PdfEditError> {
        self.check_page(page)?;
        check_rect(&original_rect)?;
        check_rect(&replacement_rect)?;
        Ok(self.operations.add(EditOperation::ReplaceText {
            id: 0,
            page,
            original_rect,
            replacement_rect,
            original_text: original_text.to_string(),
            new_text: new_text.to_string(),
            style,
        }))
    }

    pub fn remove_operation(&mut self, id: OpId) -> Result<(), PdfEditError> {
        if self.operations.remove(id) {
            Ok(())
        } else {
            Err(PdfEditError::OperationNotFound(id))
        }
    }

    pub fn begin_action(&mut self, label: &str) {
        self.operations.begin_action(ActionKind::from_label(label));
    }

    pub fn commit_action(&mut self) -> bool {
        self.operations.commit_action()
    }

    pub fn abort_action(&mut self) {
        self.operations.abort_action()
    }

    pub fn undo(&mut self) -> Option<ActionDelta> {
        self.operations.undo()
    }

    pub fn redo(&mut self) -> Option<ActionDelta> {
        self.operations.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.operations.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.operations.can_redo()
    }

    /// Operation details as JSON for recreation during redo.
    pub fn get_operation_json(&self, id: OpId) -> Option<String> {
        self.operations
            .get_operation(id)
            .and_then(|op| serde_json::to_string(op).ok())
    }

    pub fn operation_ids(&self) -> Vec<OpId> {
        self.operations.operation_ids()
    }

    pub fn has_changes(&self) -> bool {
        self.operations.has_changes()
    }

    /// Apply all operations and return the modified PDF. The log is untouched
    /// either way, so a failed export can simply be retried.
    pub fn export(&self) -> Result<Vec<u8>, PdfEditError> {
        if self.is_signed {
            return Err(PdfEditError::SignedDocument);
        }
        let exporter = self.exporter.as_ref().ok_or(PdfEditError::ExportUnavailable)?;
        let bytes = exporter.export(&self.document_bytes, self.operations.operations())?;
        tracing::info!(
            operations = self.operations.operations().len(),
            size = bytes.len(),
            "export finished"
        );
        Ok(bytes)
    }

    fn check_page(&self, page: u32) -> Result<(), PdfEditError> {
        if page == 0 || page > self.page_count {
            return Err(PdfEditError::InvalidPage {
                page,
                page_count: self.page_count,
            });
        }
        Ok(())
    }
}

fn check_rect(rect: &PdfRect) -> Result<(), PdfEditError> {
    if rect.is_valid() {
        Ok(())
    } else {
        Err(PdfEditError::InvalidRect(format!("{:?}", rect)))
    }
}

/// Parse PDF bytes and report whether the document carries signatures.
pub fn has_signatures(bytes: &[u8]) -> Result<bool, PdfEditError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfEditError::ParseError(e.to_string()))?;
    Ok(document_has_signatures(&doc))
}

fn document_has_signatures(doc: &Document) -> bool {
    let Ok(catalog) = doc.catalog() else {
        return false;
    };
    let Some(acroform) = catalog
        .get(b"AcroForm")
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
    else {
        return false;
    };

    if let Ok(flags) = acroform.get(b"SigFlags").and_then(|obj| obj.as_i64()) {
        if flags & 1 != 0 {
            return true;
        }
    }

    let Ok(fields) = acroform
        .get(b"Fields")
        .and_then(|obj| resolve(doc, obj).as_array())
    else {
        return false;
    };
    fields
        .iter()
        .filter_map(|field| resolve(doc, field).as_dict().ok())
        .any(|field| field_is_signature(doc, field, 0))
}

fn field_is_signature(doc: &Document, field: &Dictionary, depth: usize) -> bool {
    // Guard against cyclic Kids references
    if depth > 32 {
        return false;
    }
    if matches!(field.get(b"FT").and_then(|obj| obj.as_name()), Ok(name) if name == b"Sig") {
        return true;
    }
    match field.get(b"Kids").and_then(|obj| resolve(doc, obj).as_array()) {
        Ok(kids) => kids
            .iter()
            .filter_map(|kid| resolve(doc, kid).as_dict().ok())
            .any(|kid| field_is_signature(doc, kid, depth + 1)),
        Err(_) => false,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn create_test_pdf(pages: u32, signed: bool) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        };
        if signed {
            let sig_field = doc.add_object(dictionary! {
                "FT" => "Sig",
                "T" => Object::string_literal("Signature1"),
            });
            catalog.set(
                "AcroForm",
                dictionary! {
                    "Fields" => vec![Object::Reference(sig_field)],
                },
            );
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    fn session() -> LogSession {
        LogSession::new("test.pdf", &create_test_pdf(2, false)).unwrap()
    }

    #[test]
    fn test_edit_session_creation() {
        let session = session();
        assert_eq!(session.document_name(), "test.pdf");
        assert_eq!(session.page_count(), 2);
        assert!(!session.is_signed());
        assert!(!session.has_changes());
    }

    #[test]
    fn test_signed_document_detected_and_export_refused() {
        let session = LogSession::new("signed.pdf", &create_test_pdf(1, true))
            .unwrap()
            .with_exporter(
                |doc: &[u8], _: &[EditOperation]| -> Result<Vec<u8>, PdfEditError> {
                    Ok(doc.to_vec())
                },
            );
        assert!(session.is_signed());
        assert!(matches!(session.export(), Err(PdfEditError::SignedDocument)));
    }

    #[test]
    fn test_page_count_helper() {
        assert_eq!(crate::get_page_count(&create_test_pdf(3, false)).unwrap(), 3);
        assert!(has_signatures(&create_test_pdf(1, true)).unwrap());
        assert!(!has_signatures(&create_test_pdf(1, false)).unwrap());
    }

    #[test]
    fn test_invalid_bytes_rejected() {
        assert!(matches!(
            LogSession::new("junk.pdf", b"not a pdf"),
            Err(PdfEditError::ParseError(_))
        ));
    }

    #[test]
    fn test_add_text_and_json() {
        let mut session = session();
        let id = session
            .add_text(1, PdfRect::new(100.0, 700.0, 200.0, 20.0), "Hello", TextStyle::default())
            .unwrap();
        assert_eq!(id, 0);
        assert!(session.has_changes());
        let json = session.get_operation_json(id).unwrap();
        assert!(json.contains(r#""type":"AddText""#));
        assert!(json.contains("Hello"));
    }

    #[test]
    fn test_page_out_of_range_rejected() {
        let mut session = session();
        let err = session
            .add_white_rect(3, PdfRect::new(0.0, 0.0, 10.0, 10.0), "#FFFFFF")
            .unwrap_err();
        assert!(matches!(err, PdfEditError::InvalidPage { page: 3, page_count: 2 }));
    }

    #[test]
    fn test_styled_text_requires_segments() {
        let mut session = session();
        let rect = PdfRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(session
            .add_styled_text(1, rect, "[]", TextStyle::default())
            .is_err());
        assert!(session
            .add_styled_text(1, rect, "{oops", TextStyle::default())
            .is_err());
        let id = session
            .add_styled_text(
                1,
                rect,
                r#"[{"text":"Hi ","is_bold":false,"is_italic":false},{"text":"there","is_bold":true,"is_italic":false}]"#,
                TextStyle {
                    is_bold: true,
                    ..TextStyle::default()
                },
            )
            .unwrap();
        match session.log().get_operation(id) {
            Some(EditOperation::AddStyledText { segments, style, .. }) => {
                assert_eq!(segments.len(), 2);
                assert!(!style.is_bold);
            }
            other => panic!("Expected AddStyledText, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_missing_operation_is_error() {
        let mut session = session();
        assert!(matches!(
            session.remove_operation(42),
            Err(PdfEditError::OperationNotFound(42))
        ));
    }

    #[test]
    fn test_export_without_exporter_is_unavailable() {
        let session = session();
        assert!(matches!(
            session.export(),
            Err(PdfEditError::ExportUnavailable)
        ));
    }

    #[test]
    fn test_export_passes_live_operations() {
        let mut session = session().with_exporter(
            |doc: &[u8], ops: &[EditOperation]| -> Result<Vec<u8>, PdfEditError> {
                let mut out = doc.to_vec();
                out.extend_from_slice(format!("%ops={}", ops.len()).as_bytes());
                Ok(out)
            },
        );
        session
            .add_white_rect(1, PdfRect::new(0.0, 0.0, 10.0, 10.0), "#FFFFFF")
            .unwrap();
        let bytes = session.export().unwrap();
        assert!(bytes.ends_with(b"%ops=1"));
        assert!(session.has_changes());
    }
}
