use crate::error::IngestError;
use crate::extractor::{LopdfExtractor, PageText, PdfExtractor};
use crate::models::{DocumentFingerprint, UploadedDocument};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::PathBuf;

pub struct ParsedDocument {
    pub fingerprint: DocumentFingerprint,
    pub pages: Vec<PageText>,
}

pub struct PdfIngestor<X: PdfExtractor> {
    extractor: X,
    spool_dir: Option<PathBuf>,
}

impl Default for PdfIngestor<LopdfExtractor> {
    fn default() -> Self {
        Self::new(LopdfExtractor)
    }
}

impl<X: PdfExtractor> PdfIngestor<X> {
    pub fn new(extractor: X) -> Self {
        Self {
            extractor,
            spool_dir: None,
        }
    }

    /// Directory the upload is spooled into while parsing. Defaults to the
    /// system temp directory.
    pub fn with_spool_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = Some(dir.into());
        self
    }

    pub fn ingest(&self, upload: &UploadedDocument) -> Result<ParsedDocument, IngestError> {
        if upload.file_name.trim().is_empty() {
            return Err(IngestError::MissingFileName(
                "upload has an empty file name".to_string(),
            ));
        }
        if !has_pdf_extension(&upload.file_name) {
            return Err(IngestError::NotPdf(upload.file_name.clone()));
        }

        let pages = self.parse_via_spool(upload)?;
        let fingerprint = fingerprint_upload(upload, pages.len());

        Ok(ParsedDocument { fingerprint, pages })
    }

    fn parse_via_spool(&self, upload: &UploadedDocument) -> Result<Vec<PageText>, IngestError> {
        let mut builder = tempfile::Builder::new();
        builder.suffix(".pdf");

        let mut spool = match &self.spool_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        spool.write_all(&upload.bytes)?;
        spool.flush()?;

        // spool is removed when it drops, on the error path included
        self.extractor.extract_pages(spool.path())
    }
}

fn has_pdf_extension(file_name: &str) -> bool {
    PathBuf::from(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn fingerprint_upload(upload: &UploadedDocument, page_count: usize) -> DocumentFingerprint {
    let checksum = digest_bytes(&upload.bytes);

    let mut hasher = Sha256::new();
    hasher.update(upload.file_name.as_bytes());
    hasher.update(checksum.as_bytes());
    let document_id = format!("{:x}", hasher.finalize());

    DocumentFingerprint {
        document_id,
        title: upload.file_name.clone(),
        checksum,
        page_count,
        uploaded_at: Utc::now(),
    }
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::{digest_bytes, PdfIngestor};
    use crate::error::IngestError;
    use crate::extractor::{PageText, PdfExtractor};
    use crate::models::UploadedDocument;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    struct FakeExtractor {
        fail: bool,
    }

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
            assert!(path.exists(), "spool file should exist while parsing");
            if self.fail {
                return Err(IngestError::PdfParse("broken pdf".to_string()));
            }
            Ok(vec![PageText {
                number: 1,
                text: "Hello world".to_string(),
            }])
        }
    }

    #[test]
    fn non_pdf_uploads_are_rejected() {
        let ingestor = PdfIngestor::new(FakeExtractor { fail: false });
        let upload = UploadedDocument::new("notes.txt", b"plain text".to_vec());

        let result = ingestor.ingest(&upload);
        assert!(matches!(result, Err(IngestError::NotPdf(_))));
    }

    #[test]
    fn spool_file_is_removed_after_success() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ingestor =
            PdfIngestor::new(FakeExtractor { fail: false }).with_spool_dir(dir.path());
        let upload = UploadedDocument::new("report.pdf", b"%PDF-1.4\n%fake".to_vec());

        let parsed = ingestor.ingest(&upload)?;
        assert_eq!(parsed.pages.len(), 1);
        assert_eq!(parsed.fingerprint.page_count, 1);
        assert_eq!(parsed.fingerprint.title, "report.pdf");

        let leftovers = fs::read_dir(dir.path())?.count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[test]
    fn spool_file_is_removed_after_parse_failure() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let ingestor = PdfIngestor::new(FakeExtractor { fail: true }).with_spool_dir(dir.path());
        let upload = UploadedDocument::new("broken.pdf", b"%PDF-1.4\n%broken".to_vec());

        let result = ingestor.ingest(&upload);
        assert!(matches!(result, Err(IngestError::PdfParse(_))));

        let leftovers = fs::read_dir(dir.path())?.count();
        assert_eq!(leftovers, 0);
        Ok(())
    }

    #[test]
    fn checksum_is_reproducible() {
        assert_eq!(digest_bytes(b"abc"), digest_bytes(b"abc"));
        assert_ne!(digest_bytes(b"abc"), digest_bytes(b"abd"));
    }

    #[test]
    fn fingerprint_follows_content() {
        let ingestor = PdfIngestor::new(FakeExtractor { fail: false });
        let first = ingestor
            .ingest(&UploadedDocument::new("a.pdf", b"one".to_vec()))
            .unwrap();
        let second = ingestor
            .ingest(&UploadedDocument::new("a.pdf", b"two".to_vec()))
            .unwrap();

        assert_ne!(first.fingerprint.document_id, second.fingerprint.document_id);
    }
}
