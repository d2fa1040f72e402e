//! XML request bodies and response parsing for the S3 REST API

use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use tessera_core::types::{DeleteError, DeleteObject, Part, PartInfo, UploadInfo};
use tessera_core::utils::{parse_etag, xml_escape};
use tessera_core::{Error, ErrorResponse, Result, DEFAULT_REGION};

const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

fn decode<'de, T: Deserialize<'de>>(body: &'de str, what: &str) -> Result<T> {
    from_str(body).map_err(|e| Error::MalformedXml(format!("{}: {}", what, e)))
}

fn body_str(body: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(body)
}

fn parse_xml_datetime(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Name of the document's root element, if it has one
pub fn root_element(body: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(body);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

// ============= Errors =============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorXml {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    resource: Option<String>,
    request_id: Option<String>,
    host_id: Option<String>,
    bucket_name: Option<String>,
    key: Option<String>,
}

/// Parse an `<Error>` document
pub fn parse_error(status: u16, body: &[u8]) -> Result<ErrorResponse> {
    let text = body_str(body);
    let xml: ErrorXml = decode(&text, "Error")?;
    Ok(ErrorResponse {
        status,
        code: xml.code,
        message: xml.message,
        resource: xml.resource,
        request_id: xml.request_id,
        host_id: xml.host_id,
        bucket: xml.bucket_name,
        key: xml.key,
    })
}

// ============= Bucket location =============

#[derive(Debug, Deserialize)]
struct LocationConstraintXml {
    #[serde(rename = "$text", default)]
    region: Option<String>,
}

/// Parse `GET ?location`. An empty constraint means `us-east-1` and the
/// legacy `EU` value means `eu-west-1`.
pub fn parse_location_constraint(body: &[u8]) -> Result<String> {
    let text = body_str(body);
    if text.trim().is_empty() {
        return Ok(DEFAULT_REGION.to_string());
    }
    let xml: LocationConstraintXml = decode(&text, "LocationConstraint")?;
    let region = match xml.region.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_REGION,
        Some("EU") => "eu-west-1",
        Some(region) => region,
    };
    Ok(region.to_string())
}

pub fn create_bucket_configuration(region: &str) -> String {
    format!(
        r#"<CreateBucketConfiguration xmlns="{}"><LocationConstraint>{}</LocationConstraint></CreateBucketConfiguration>"#,
        S3_NAMESPACE,
        xml_escape(region)
    )
}

// ============= Multipart Upload =============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateMultipartUploadXml {
    upload_id: String,
}

pub fn parse_initiate_multipart_upload(body: &[u8]) -> Result<String> {
    let text = body_str(body);
    let xml: InitiateMultipartUploadXml = decode(&text, "InitiateMultipartUploadResult")?;
    if xml.upload_id.is_empty() {
        return Err(Error::MalformedXml("empty UploadId".into()));
    }
    Ok(xml.upload_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteMultipartUploadResult {
    pub location: Option<String>,
    pub bucket: Option<String>,
    pub key: Option<String>,
    pub etag: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CompleteMultipartUploadXml {
    location: Option<String>,
    bucket: Option<String>,
    key: Option<String>,
    #[serde(rename = "ETag", default)]
    etag: String,
}

/// Parse the completion result. A `200 OK` whose body is an `<Error>`
/// document is reported as a server error.
pub fn parse_complete_multipart_upload(body: &[u8]) -> Result<CompleteMultipartUploadResult> {
    if root_element(body).as_deref() == Some("Error") {
        return Err(Error::Server(parse_error(200, body)?));
    }
    let text = body_str(body);
    let xml: CompleteMultipartUploadXml = decode(&text, "CompleteMultipartUploadResult")?;
    Ok(CompleteMultipartUploadResult {
        location: xml.location,
        bucket: xml.bucket,
        key: xml.key,
        etag: parse_etag(&xml.etag),
    })
}

/// Build the `CompleteMultipartUpload` request body. Parts must already be
/// in ascending part-number order.
pub fn complete_multipart_upload_body(parts: &[Part]) -> String {
    let mut xml = String::from("<CompleteMultipartUpload>");
    for part in parts {
        xml.push_str(&format!(
            "<Part><PartNumber>{}</PartNumber><ETag>\"{}\"</ETag></Part>",
            part.part_number,
            xml_escape(&part.etag)
        ));
    }
    xml.push_str("</CompleteMultipartUpload>");
    xml
}

#[derive(Debug, Clone, Default)]
pub struct ListPartsPage {
    pub parts: Vec<PartInfo>,
    pub is_truncated: bool,
    pub next_part_number_marker: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListPartsXml {
    #[serde(default)]
    is_truncated: bool,
    next_part_number_marker: Option<String>,
    #[serde(rename = "Part", default)]
    parts: Vec<PartXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PartXml {
    part_number: u32,
    #[serde(rename = "ETag", default)]
    etag: String,
    #[serde(default)]
    size: u64,
    last_modified: Option<String>,
}

pub fn parse_list_parts(body: &[u8]) -> Result<ListPartsPage> {
    let text = body_str(body);
    let xml: ListPartsXml = decode(&text, "ListPartsResult")?;
    Ok(ListPartsPage {
        parts: xml
            .parts
            .into_iter()
            .map(|p| PartInfo {
                part_number: p.part_number,
                etag: parse_etag(&p.etag),
                size: p.size,
                last_modified: parse_xml_datetime(p.last_modified.as_deref()),
            })
            .collect(),
        is_truncated: xml.is_truncated,
        next_part_number_marker: xml
            .next_part_number_marker
            .and_then(|m| m.trim().parse().ok()),
    })
}

#[derive(Debug, Clone, Default)]
pub struct ListUploadsPage {
    pub uploads: Vec<UploadInfo>,
    pub is_truncated: bool,
    pub next_key_marker: Option<String>,
    pub next_upload_id_marker: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListUploadsXml {
    #[serde(default)]
    is_truncated: bool,
    next_key_marker: Option<String>,
    next_upload_id_marker: Option<String>,
    #[serde(rename = "Upload", default)]
    uploads: Vec<UploadXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UploadXml {
    key: String,
    upload_id: String,
    initiated: Option<String>,
}

pub fn parse_list_multipart_uploads(body: &[u8]) -> Result<ListUploadsPage> {
    let text = body_str(body);
    let xml: ListUploadsXml = decode(&text, "ListMultipartUploadsResult")?;
    Ok(ListUploadsPage {
        uploads: xml
            .uploads
            .into_iter()
            .map(|u| UploadInfo {
                key: u.key,
                upload_id: u.upload_id,
                initiated: parse_xml_datetime(u.initiated.as_deref()),
            })
            .collect(),
        is_truncated: xml.is_truncated,
        next_key_marker: xml.next_key_marker.filter(|m| !m.is_empty()),
        next_upload_id_marker: xml.next_upload_id_marker.filter(|m| !m.is_empty()),
    })
}

// ============= Delete Objects =============

pub fn delete_objects_body(objects: &[DeleteObject], quiet: bool) -> String {
    let mut xml = String::from("<Delete>");
    if quiet {
        xml.push_str("<Quiet>true</Quiet>");
    }
    for object in objects {
        xml.push_str("<Object><Key>");
        xml.push_str(&xml_escape(&object.key));
        xml.push_str("</Key>");
        if let Some(ref vid) = object.version_id {
            xml.push_str("<VersionId>");
            xml.push_str(&xml_escape(vid));
            xml.push_str("</VersionId>");
        }
        xml.push_str("</Object>");
    }
    xml.push_str("</Delete>");
    xml
}

#[derive(Debug, Deserialize)]
struct DeleteResultXml {
    #[serde(rename = "Error", default)]
    errors: Vec<DeleteErrorXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteErrorXml {
    #[serde(default)]
    key: String,
    version_id: Option<String>,
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Per-key failures of a multi-object delete
pub fn parse_delete_result(body: &[u8]) -> Result<Vec<DeleteError>> {
    let text = body_str(body);
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let xml: DeleteResultXml = decode(&text, "DeleteResult")?;
    Ok(xml
        .errors
        .into_iter()
        .map(|e| DeleteError {
            key: e.key,
            version_id: e.version_id,
            code: e.code,
            message: e.message,
        })
        .collect())
}
