//! External record shapes and their conversion into the report model.
//!
//! The inventory API and the evidence service hand over loosely shaped JSON
//! where any field may be missing. Everything is parsed here, once; the
//! resulting [`Platform`] and [`Evidence`] values are complete.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};
use crate::model::{Evidence, Piece, Platform, PlatformStatus};
use crate::validation::validate_evidence_batch;

/// Platform as returned by the inventory API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPlatform {
    /// Record identifier.
    pub id: Option<String>,
    /// Display key.
    pub platform_number: Option<String>,
    /// Kind of load.
    #[serde(rename = "type")]
    pub platform_type: Option<String>,
    /// Reception date (`YYYY-MM-DD` or RFC 3339).
    pub reception_date: Option<String>,
    /// Declared material types.
    pub material_types: Option<Vec<String>>,
    /// Provider or client name.
    #[serde(alias = "client")]
    pub provider: Option<String>,
    /// Driver name.
    #[serde(alias = "driverName")]
    pub driver: Option<String>,
    /// Weighing ticket.
    #[serde(alias = "ticket")]
    pub ticket_number: Option<String>,
    /// Standard width in metres.
    pub standard_width: Option<f64>,
    /// Status wire value.
    pub status: Option<String>,
    /// Notes.
    #[serde(alias = "observations")]
    pub notes: Option<String>,
    /// Creator.
    pub created_by: Option<String>,
    /// Pieces.
    pub pieces: Option<Vec<RawPiece>>,
    /// Precomputed total length.
    pub total_length: Option<f64>,
    /// Precomputed total linear metres.
    pub total_linear_meters: Option<f64>,
}

/// Piece as returned by the inventory API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPiece {
    /// Record identifier.
    pub id: Option<String>,
    /// Sequential number.
    pub number: Option<u32>,
    /// Length in metres.
    pub length: Option<f64>,
    /// Standard width in metres.
    pub standard_width: Option<f64>,
    /// Linear metres.
    pub linear_meters: Option<f64>,
    /// Material label.
    pub material: Option<String>,
}

/// Evidence record as returned by the evidence service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEvidence {
    /// Record identifier.
    pub id: Option<String>,
    /// File name.
    #[serde(alias = "fileName", alias = "name")]
    pub filename: Option<String>,
    /// MIME type.
    #[serde(alias = "type")]
    pub mime_type: Option<String>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Upload timestamp (RFC 3339).
    pub uploaded_at: Option<String>,
    /// Uploader.
    pub uploaded_by: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Retrievable URL.
    pub url: Option<String>,
}

/// Response body of the evidence upload endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EvidenceUploadResponse {
    /// Whether the upload succeeded.
    pub success: bool,
    /// Stored evidence, when successful.
    pub evidence: Option<RawEvidence>,
    /// Error message, when not.
    pub error: Option<String>,
}

impl EvidenceUploadResponse {
    /// Parse a response body.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if the body is not valid JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert into the stored evidence or the service's rejection.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UploadRejected`] when the service reported
    /// failure or omitted the record, or a field error if the record is malformed.
    pub fn into_result(self) -> CoreResult<Evidence> {
        match (self.success, self.evidence) {
            (true, Some(raw)) => Evidence::try_from(raw),
            (true, None) => Err(CoreError::UploadRejected(
                "response carried no evidence record".to_string(),
            )),
            (false, _) => Err(CoreError::UploadRejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(field: &'static str, value: &str) -> CoreResult<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .map_err(|e| CoreError::invalid(field, format!("{value:?}: {e}")))
}

impl TryFrom<RawPiece> for Piece {
    type Error = CoreError;

    fn try_from(raw: RawPiece) -> CoreResult<Self> {
        let number = raw.number.unwrap_or(0);
        let length = raw.length.unwrap_or(0.0);
        let standard_width = raw.standard_width.unwrap_or(0.0);
        if length < 0.0 || standard_width < 0.0 {
            return Err(CoreError::invalid(
                "pieces",
                format!("piece {number} has a negative dimension"),
            ));
        }
        Ok(Self {
            id: non_blank(raw.id).unwrap_or_else(|| format!("piece-{number}")),
            number,
            length,
            standard_width,
            linear_meters: raw.linear_meters.unwrap_or(length * standard_width),
            material: non_blank(raw.material),
        })
    }
}

impl TryFrom<RawPlatform> for Platform {
    type Error = CoreError;

    fn try_from(raw: RawPlatform) -> CoreResult<Self> {
        let platform_number =
            non_blank(raw.platform_number).ok_or(CoreError::MissingPlatformNumber)?;
        let reception_date = raw
            .reception_date
            .as_deref()
            .ok_or(CoreError::MissingField("receptionDate"))
            .and_then(|value| parse_date("receptionDate", value))?;
        let status = match raw.status.as_deref() {
            None => PlatformStatus::default(),
            Some(value) => PlatformStatus::parse(value)
                .ok_or_else(|| CoreError::invalid("status", value.to_string()))?,
        };
        let standard_width = raw.standard_width.unwrap_or(0.0);

        let mut pieces = Vec::new();
        for (idx, mut raw_piece) in raw.pieces.unwrap_or_default().into_iter().enumerate() {
            if raw_piece.number.is_none() {
                raw_piece.number = u32::try_from(idx + 1).ok();
            }
            if raw_piece.standard_width.is_none() {
                raw_piece.standard_width = Some(standard_width);
            }
            pieces.push(Piece::try_from(raw_piece)?);
        }

        tracing::debug!(
            platform = %platform_number,
            pieces = pieces.len(),
            "parsed platform snapshot"
        );

        Ok(Self {
            id: non_blank(raw.id).unwrap_or_else(|| platform_number.clone()),
            platform_type: non_blank(raw.platform_type).unwrap_or_else(|| "Plataforma".to_string()),
            reception_date,
            material_types: raw
                .material_types
                .unwrap_or_default()
                .into_iter()
                .filter_map(|m| non_blank(Some(m)))
                .collect(),
            provider: raw.provider.unwrap_or_default(),
            driver: raw.driver.unwrap_or_default(),
            ticket_number: raw.ticket_number.unwrap_or_default(),
            standard_width,
            status,
            notes: raw.notes.unwrap_or_default(),
            created_by: raw.created_by.unwrap_or_default(),
            pieces,
            total_length: raw.total_length.unwrap_or(0.0),
            total_linear_meters: raw.total_linear_meters.unwrap_or(0.0),
            platform_number,
        })
    }
}

impl TryFrom<RawEvidence> for Evidence {
    type Error = CoreError;

    fn try_from(raw: RawEvidence) -> CoreResult<Self> {
        let filename = non_blank(raw.filename).ok_or(CoreError::MissingField("filename"))?;
        let url = non_blank(raw.url).ok_or(CoreError::MissingField("url"))?;
        url::Url::parse(&url).map_err(|e| CoreError::invalid("url", e.to_string()))?;
        let uploaded_at = match raw.uploaded_at.as_deref() {
            Some(value) => DateTime::parse_from_rfc3339(value.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| CoreError::invalid("uploadedAt", e.to_string()))?,
            None => return Err(CoreError::MissingField("uploadedAt")),
        };

        Ok(Self {
            id: non_blank(raw.id).unwrap_or_else(|| filename.clone()),
            mime_type: non_blank(raw.mime_type)
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size_bytes: raw.size.unwrap_or(0),
            uploaded_at,
            uploaded_by: raw.uploaded_by.unwrap_or_default(),
            description: non_blank(raw.description),
            url,
            filename,
        })
    }
}

impl Platform {
    /// Parse a platform snapshot from inventory API JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the record fails validation.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let raw: RawPlatform = serde_json::from_str(json)?;
        Self::try_from(raw)
    }
}

impl Evidence {
    /// Parse a JSON array of evidence records.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any record fails validation.
    pub fn list_from_json(json: &str) -> CoreResult<Vec<Self>> {
        let raw: Vec<RawEvidence> = serde_json::from_str(json)?;
        raw.into_iter().map(Self::try_from).collect()
    }

    /// Parse a JSON array of evidence records and check the attachment limits.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if a file has an unsupported type or
    /// the files exceed the per-file or batch size limits, otherwise the same
    /// errors as [`Evidence::list_from_json`].
    pub fn validated_list_from_json(json: &str) -> CoreResult<Vec<Self>> {
        let evidence = Self::list_from_json(json)?;
        validate_evidence_batch(
            evidence
                .iter()
                .map(|e| (e.filename.as_str(), e.mime_type.as_str(), e.size_bytes)),
        )?;
        Ok(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_defaults_missing_fields() {
        let platform = Platform::from_json(
            r#"{"platformNumber": " P-042 ", "receptionDate": "2024-03-15"}"#,
        )
        .expect("parse");
        assert_eq!(platform.platform_number, "P-042");
        assert_eq!(platform.id, "P-042");
        assert!(platform.pieces.is_empty());
        assert_eq!(platform.status, PlatformStatus::InProgress);
        assert_eq!(platform.provider, "");
        assert!(platform.total_linear_meters.abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_platform_number_rejected() {
        let err = Platform::from_json(r#"{"platformNumber": "  ", "receptionDate": "2024-03-15"}"#)
            .expect_err("blank number");
        assert!(matches!(err, CoreError::MissingPlatformNumber));
    }

    #[test]
    fn test_rfc3339_reception_date() {
        let platform = Platform::from_json(
            r#"{"platformNumber": "P-1", "receptionDate": "2024-03-15T10:30:00Z"}"#,
        )
        .expect("parse");
        assert_eq!(platform.reception_date.to_string(), "2024-03-15");
    }

    #[test]
    fn test_invalid_status_rejected() {
        let err = Platform::from_json(
            r#"{"platformNumber": "P-1", "receptionDate": "2024-03-15", "status": "lost"}"#,
        )
        .expect_err("bad status");
        assert!(matches!(err, CoreError::InvalidField { field: "status", .. }));
    }

    #[test]
    fn test_piece_defaults_fill_number_and_linear_meters() {
        let platform = Platform::from_json(
            r#"{
                "platformNumber": "P-1",
                "receptionDate": "2024-03-15",
                "standardWidth": 1.5,
                "pieces": [{"length": 2.0}, {"number": 7, "length": 1.0, "linearMeters": 9.9, "material": "  "}]
            }"#,
        )
        .expect("parse");
        assert_eq!(platform.pieces[0].number, 1);
        assert!((platform.pieces[0].standard_width - 1.5).abs() < f64::EPSILON);
        assert!((platform.pieces[0].linear_meters - 3.0).abs() < f64::EPSILON);
        assert_eq!(platform.pieces[1].number, 7);
        assert!((platform.pieces[1].linear_meters - 9.9).abs() < f64::EPSILON);
        assert_eq!(platform.pieces[1].material, None);
    }

    #[test]
    fn test_upload_response_success() {
        let response = EvidenceUploadResponse::from_json(
            r#"{
                "success": true,
                "evidence": {
                    "id": "ev-1",
                    "fileName": "foto.jpg",
                    "type": "image/jpeg",
                    "size": 2048,
                    "uploadedAt": "2024-03-15T12:00:00Z",
                    "uploadedBy": "ana",
                    "url": "https://files.example.com/ev-1"
                }
            }"#,
        )
        .expect("parse");
        let evidence = response.into_result().expect("evidence");
        assert_eq!(evidence.filename, "foto.jpg");
        assert!(evidence.is_image());
        assert_eq!(evidence.size_bytes, 2048);
    }

    #[test]
    fn test_upload_response_failure() {
        let response =
            EvidenceUploadResponse::from_json(r#"{"success": false, "error": "quota exceeded"}"#)
                .expect("parse");
        let err = response.into_result().expect_err("rejected");
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_evidence_bad_url_rejected() {
        let err = Evidence::list_from_json(
            r#"[{"filename": "a.pdf", "url": "not a url", "uploadedAt": "2024-03-15T12:00:00Z"}]"#,
        )
        .expect_err("bad url");
        assert!(matches!(err, CoreError::InvalidField { field: "url", .. }));
    }

    #[test]
    fn test_validated_evidence_rejects_unsupported_type() {
        let json = r#"[{"filename": "notes.exe", "mimeType": "application/x-msdownload",
                        "size": 10, "url": "https://files.example.com/notes.exe",
                        "uploadedAt": "2024-03-15T12:00:00Z"}]"#;
        assert_eq!(Evidence::list_from_json(json).expect("parse").len(), 1);
        let err = Evidence::validated_list_from_json(json).expect_err("exe");
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
