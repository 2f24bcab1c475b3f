use crate::error::ContentFetchError;
use crate::i18n::Language;
use crate::routes::PageKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Image or video reference with its intrinsic size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// Downloadable file, e.g. a financial report PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAsset {
    pub url: String,
    #[serde(alias = "originalFilename")]
    pub filename: String,
    /// Size in bytes
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageHeader {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub background: Option<MediaRef>,
}

/// One block of page body content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Block type as named by the CMS (`_type`), e.g. "teamSection"
    #[serde(rename = "_type", default)]
    pub kind: String,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub files: Vec<FileAsset>,
    /// Section-specific fields (team bios, stats, ...) passed through untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Shape of a page document as returned inside the query envelope.
#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    header: Option<PageHeader>,
    #[serde(default)]
    sections: Vec<Section>,
    #[serde(default)]
    media: Vec<MediaRef>,
    #[serde(default)]
    files: Vec<FileAsset>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

/// Localized content for one page. Immutable once fetched; a newer fetch
/// replaces it rather than updating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageContentDocument {
    pub page: PageKey,
    pub language: Language,
    pub header: Option<PageHeader>,
    pub sections: Vec<Section>,
    pub media: Vec<MediaRef>,
    pub files: Vec<FileAsset>,
    /// Remaining top-level fields, minus CMS bookkeeping (`_id`, `_rev`, ...)
    pub fields: Map<String, Value>,
}

impl PageContentDocument {
    /// Build a document from the `result` value of a CMS query.
    pub fn from_value(
        page: PageKey,
        language: Language,
        value: Value,
    ) -> Result<Self, ContentFetchError> {
        let raw: RawDocument =
            serde_json::from_value(value).map_err(|e| ContentFetchError::Decode(e.to_string()))?;

        let fields = raw
            .fields
            .into_iter()
            .filter(|(key, _)| !key.starts_with('_') && key != "language")
            .collect();

        Ok(Self {
            page,
            language,
            header: raw.header,
            sections: raw.sections,
            media: raw.media,
            files: raw.files,
            fields,
        })
    }

    pub fn title(&self) -> Option<&str> {
        self.header.as_ref().map(|h| h.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_full_document() {
        let value = json!({
            "_id": "investorsPage-vi",
            "_rev": "abc",
            "language": "vi",
            "header": {
                "title": "Quan hệ cổ đông",
                "background": { "url": "https://cdn.example.com/bg.jpg", "width": 1920, "height": 1080 }
            },
            "sections": [
                {
                    "_type": "reportList",
                    "heading": "Báo cáo tài chính",
                    "files": [
                        { "url": "https://cdn.example.com/q1.pdf", "originalFilename": "q1.pdf", "size": 204800, "mimeType": "application/pdf" }
                    ],
                    "year": 2024
                }
            ],
            "ctaLabel": "Liên hệ"
        });

        let doc = PageContentDocument::from_value(PageKey::Investors, Language::VIETNAMESE, value)
            .expect("document should decode");

        assert_eq!(doc.title(), Some("Quan hệ cổ đông"));
        let background = doc.header.as_ref().unwrap().background.as_ref().unwrap();
        assert_eq!(background.width, Some(1920));

        let section = &doc.sections[0];
        assert_eq!(section.kind, "reportList");
        assert_eq!(section.files[0].filename, "q1.pdf");
        assert_eq!(section.files[0].size, Some(204800));
        assert_eq!(section.fields.get("year"), Some(&json!(2024)));

        assert_eq!(doc.fields.get("ctaLabel"), Some(&json!("Liên hệ")));
        assert!(!doc.fields.contains_key("_id"));
        assert!(!doc.fields.contains_key("language"));
    }

    #[test]
    fn test_from_value_minimal_document() {
        let doc = PageContentDocument::from_value(PageKey::Terms, Language::ENGLISH, json!({}))
            .expect("empty object is a valid document");

        assert!(doc.header.is_none());
        assert!(doc.sections.is_empty());
        assert_eq!(doc.title(), None);
    }

    #[test]
    fn test_from_value_rejects_wrong_shape() {
        let err = PageContentDocument::from_value(
            PageKey::About,
            Language::ENGLISH,
            json!({ "header": "not an object" }),
        )
        .unwrap_err();

        assert!(matches!(err, ContentFetchError::Decode(_)));
    }

    #[test]
    fn test_serialized_document_carries_language() {
        let doc =
            PageContentDocument::from_value(PageKey::About, Language::VIETNAMESE, json!({})).unwrap();
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["language"], json!("vi"));
        assert_eq!(value["page"], json!({ "page": "about" }));
    }
}
