//! Object uploads: single PUT for small objects, resumable multipart for
//! everything else.
//!
//! A multipart upload first looks for an incomplete upload of the same key on
//! the server. Parts already stored there are skipped when their size and
//! ETag match the bytes read locally, so an interrupted upload continues
//! where it stopped. Parts go up one at a time, in order.

use std::collections::BTreeMap;
use std::io::Cursor;

use bytes::Bytes;
use http::Method;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tessera_core::types::{ObjectWriteResponse, Part, PartInfo, UploadInfo, UploadSession};
use tessera_core::utils::{parse_etag, validate_bucket_name, validate_object_name};
use tessera_core::{
    Error, ErrorResponse, Result, MAX_OBJECT_SIZE, MIN_PART_SIZE, PART_SIZE_DIVISOR,
};
use tessera_crypto::{md5_base64, md5_hash};

use crate::client::{S3Client, S3Request};
use crate::pager::ListPartsPager;
use crate::response::RequestTarget;
use crate::xml::{
    complete_multipart_upload_body, parse_complete_multipart_upload,
    parse_initiate_multipart_upload,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const VERSION_ID_HEADER: &str = "x-amz-version-id";

/// Part boundaries for an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPlan {
    pub part_size: u64,
    pub part_count: u64,
    pub last_part_size: u64,
}

impl PartPlan {
    /// Plan an object of `size` bytes; an unknown size is planned as the
    /// largest object allowed.
    pub fn for_size(size: Option<u64>) -> Result<Self> {
        let object_size = match size {
            Some(size) if size > MAX_OBJECT_SIZE => {
                return Err(Error::EntityTooLarge {
                    size,
                    max: MAX_OBJECT_SIZE,
                })
            }
            Some(size) => size,
            None => MAX_OBJECT_SIZE,
        };

        let part_size = MIN_PART_SIZE.max(object_size.div_ceil(PART_SIZE_DIVISOR));
        let part_count = object_size.div_ceil(part_size);
        let last_part_size = match part_count {
            0 => 0,
            n => object_size - part_size * (n - 1),
        };

        Ok(Self {
            part_size,
            part_count,
            last_part_size,
        })
    }

    /// Expected length of 1-based part `part_number`
    pub fn part_length(&self, part_number: u64) -> u64 {
        if part_number == self.part_count {
            self.last_part_size
        } else {
            self.part_size
        }
    }
}

/// Read up to `size` bytes. Returns a shorter buffer when the stream ends
/// early and `None` when it was already exhausted.
pub async fn read_full<R>(reader: &mut R, size: u64) -> Result<Option<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(size.min(MIN_PART_SIZE) as usize);
    let read = reader.take(size).read_to_end(&mut buf).await?;
    if read == 0 && size > 0 {
        return Ok(None);
    }
    Ok(Some(Bytes::from(buf)))
}

/// Count bytes left in `reader`, reading at most one minimum part
async fn trailing_bytes<R>(reader: &mut R) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut rest = reader.take(MIN_PART_SIZE);
    Ok(tokio::io::copy(&mut rest, &mut tokio::io::sink()).await?)
}

/// Parameters of one object upload
#[derive(Debug, Clone, Default)]
pub struct PutObjectArgs {
    pub bucket: String,
    pub key: String,
    /// Declared object size; `None` streams until the reader is exhausted
    pub size: Option<u64>,
    pub content_type: Option<String>,
    /// Extra request headers, e.g. `x-amz-meta-*`
    pub headers: BTreeMap<String, String>,
    /// Checked before every part
    pub cancel: Option<CancellationToken>,
}

impl PutObjectArgs {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_metadata(self, name: &str, value: impl Into<String>) -> Self {
        self.with_header(&format!("x-amz-meta-{}", name), value)
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn content_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    fn size_mismatch(&self, expected: u64, actual: u64) -> Error {
        Error::SizeMismatch {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
            expected,
            actual,
        }
    }
}

/// Parts stored server-side for a resumed upload, consumed in part order
struct ExistingParts<'a> {
    pager: Option<ListPartsPager<'a>>,
    pending: Option<PartInfo>,
}

impl<'a> ExistingParts<'a> {
    fn none() -> Self {
        Self {
            pager: None,
            pending: None,
        }
    }

    fn of(pager: ListPartsPager<'a>) -> Self {
        Self {
            pager: Some(pager),
            pending: None,
        }
    }

    /// The stored part numbered `part_number`, if any. Calls must use
    /// ascending part numbers.
    async fn find(&mut self, part_number: u32) -> Result<Option<PartInfo>> {
        let Some(pager) = self.pager.as_mut() else {
            return Ok(None);
        };

        loop {
            if self.pending.is_none() {
                self.pending = pager.next().await?;
            }
            match self.pending.take() {
                None => return Ok(None),
                Some(part) if part.part_number < part_number => continue,
                Some(part) if part.part_number == part_number => return Ok(Some(part)),
                Some(part) => {
                    self.pending = Some(part);
                    return Ok(None);
                }
            }
        }
    }
}

impl S3Client {
    /// Upload an object read from `reader`.
    ///
    /// Objects under 5 MiB go up in a single PUT; larger or unsized objects
    /// use a multipart upload that resumes an incomplete upload of the same
    /// key when one exists. A failed multipart upload is left on the server
    /// so a later call can continue it.
    pub async fn put_object<R>(
        &self,
        args: &PutObjectArgs,
        mut reader: R,
    ) -> Result<ObjectWriteResponse>
    where
        R: AsyncRead + Unpin + Send,
    {
        validate_bucket_name(&args.bucket)?;
        validate_object_name(&args.key)?;
        let plan = PartPlan::for_size(args.size)?;
        args.check_cancelled()?;

        match args.size {
            Some(size) if size < MIN_PART_SIZE => {
                let data = read_full(&mut reader, size).await?.unwrap_or_default();
                let read = data.len() as u64;
                if read < size {
                    return Err(Error::ShortRead {
                        expected: size,
                        actual: read,
                    });
                }
                let extra = trailing_bytes(&mut reader).await?;
                if extra > 0 {
                    return Err(args.size_mismatch(size, size + extra));
                }
                self.put_object_single(args, data).await
            }
            Some(_) => self.put_object_multipart(args, &plan, &mut reader, None).await,
            None => {
                let first = read_full(&mut reader, plan.part_size)
                    .await?
                    .unwrap_or_default();
                if (first.len() as u64) < plan.part_size {
                    // the whole stream fit in one part
                    self.put_object_single(args, first).await
                } else {
                    self.put_object_multipart(args, &plan, &mut reader, Some(first))
                        .await
                }
            }
        }
    }

    /// Upload an in-memory object
    pub async fn put_object_bytes(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> Result<ObjectWriteResponse> {
        let mut args = PutObjectArgs::new(bucket, key).with_size(data.len() as u64);
        if let Some(content_type) = content_type {
            args = args.with_content_type(content_type);
        }
        self.put_object(&args, Cursor::new(data)).await
    }

    async fn put_object_single(
        &self,
        args: &PutObjectArgs,
        data: Bytes,
    ) -> Result<ObjectWriteResponse> {
        let size = data.len() as u64;
        let request = S3Request::new(Method::PUT, RequestTarget::object(&args.bucket, &args.key))
            .headers(&args.headers)
            .header("content-type", args.content_type())
            .body(data);
        let response = self.execute(request).await?;

        debug!("Put {}/{} ({} bytes)", args.bucket, args.key, size);
        Ok(ObjectWriteResponse {
            bucket: args.bucket.clone(),
            key: args.key.clone(),
            etag: response.header("etag").map(parse_etag).unwrap_or_default(),
            version_id: response.header(VERSION_ID_HEADER).map(String::from),
            upload_id: None,
            part_count: 1,
            size,
        })
    }

    async fn put_object_multipart<R>(
        &self,
        args: &PutObjectArgs,
        plan: &PartPlan,
        reader: &mut R,
        first_chunk: Option<Bytes>,
    ) -> Result<ObjectWriteResponse>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut session = match self.latest_incomplete_upload(&args.bucket, &args.key).await? {
            Some(upload) => {
                info!(
                    "Resuming upload {} of {}/{}",
                    upload.upload_id, args.bucket, args.key
                );
                let mut session = UploadSession::new(upload.upload_id, &args.bucket, &args.key);
                session.resumed = true;
                session
            }
            None => {
                let upload_id = self.initiate_multipart_upload(args).await?;
                info!(
                    "Initiated upload {} of {}/{}",
                    upload_id, args.bucket, args.key
                );
                UploadSession::new(upload_id, &args.bucket, &args.key)
            }
        };
        session.content_type = Some(args.content_type().to_string());
        session.declared_size = args.size;

        let upload_id = session.upload_id.clone();
        self.upload_session(args, plan, reader, first_chunk, &mut session)
            .await
            .map_err(|e| e.with_upload(&args.bucket, &args.key, upload_id))
    }

    async fn upload_session<R>(
        &self,
        args: &PutObjectArgs,
        plan: &PartPlan,
        reader: &mut R,
        mut first_chunk: Option<Bytes>,
        session: &mut UploadSession,
    ) -> Result<ObjectWriteResponse>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut existing = if session.resumed {
            ExistingParts::of(self.list_parts(&args.bucket, &args.key, &session.upload_id))
        } else {
            ExistingParts::none()
        };

        let mut total: u64 = 0;
        let mut uploaded = 0;
        let mut full_plan = false;

        for part_number in 1..=plan.part_count {
            args.check_cancelled()?;

            let expected = plan.part_length(part_number);
            let chunk = match first_chunk.take() {
                Some(chunk) => Some(chunk),
                None => read_full(reader, expected).await?,
            };
            let Some(data) = chunk else {
                match args.size {
                    Some(size) => return Err(args.size_mismatch(size, total)),
                    None => break,
                }
            };

            let len = data.len() as u64;
            if len < expected {
                if let Some(size) = args.size {
                    return Err(args.size_mismatch(size, total + len));
                }
            }
            total += len;

            let part_number = part_number as u32;
            let md5 = md5_hash(&data);
            let part = match existing.find(part_number).await? {
                Some(stored) if stored.size == len && stored.etag == md5 => {
                    debug!("Part {} already uploaded, skipping", part_number);
                    Part::new(part_number, stored.etag, len)
                }
                _ => {
                    uploaded += 1;
                    self.upload_part(&args.bucket, &args.key, &session.upload_id, part_number, data)
                        .await?
                }
            };
            session.parts.push(part);

            if len < expected {
                break;
            }
            full_plan = part_number as u64 == plan.part_count;
        }

        let extra = trailing_bytes(reader).await?;
        if extra > 0 {
            return Err(match args.size {
                Some(size) => args.size_mismatch(size, total + extra),
                None if full_plan => Error::EntityTooLarge {
                    size: total + extra,
                    max: MAX_OBJECT_SIZE,
                },
                None => Error::InternalError("stream not drained after final part".into()),
            });
        }

        args.check_cancelled()?;
        info!(
            "Completing upload {} of {}/{}: {} parts, {} uploaded now",
            session.upload_id,
            args.bucket,
            args.key,
            session.parts.len(),
            uploaded
        );
        let mut response = self
            .complete_multipart_upload(&args.bucket, &args.key, &session.upload_id, &session.parts)
            .await?;
        response.size = session.uploaded_size();
        Ok(response)
    }

    /// Most recently initiated incomplete upload whose key equals `key`
    async fn latest_incomplete_upload(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<UploadInfo>> {
        let mut uploads = self.list_incomplete_uploads(bucket, Some(key));
        let mut latest: Option<UploadInfo> = None;
        while let Some(upload) = uploads.next().await? {
            if upload.key != key {
                continue;
            }
            if latest.as_ref().map_or(true, |l| upload.initiated >= l.initiated) {
                latest = Some(upload);
            }
        }
        Ok(latest)
    }

    pub(crate) async fn initiate_multipart_upload(&self, args: &PutObjectArgs) -> Result<String> {
        let request = S3Request::new(Method::POST, RequestTarget::object(&args.bucket, &args.key))
            .query("uploads", "")
            .headers(&args.headers)
            .header("content-type", args.content_type());
        let response = self.execute(request).await?;
        parse_initiate_multipart_upload(&response.body)
    }

    pub(crate) async fn upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: u32,
        data: Bytes,
    ) -> Result<Part> {
        let size = data.len() as u64;
        let request = S3Request::new(Method::PUT, RequestTarget::object(bucket, key))
            .query("partNumber", part_number.to_string())
            .query("uploadId", upload_id)
            .header("content-md5", md5_base64(&data))
            .body(data);
        let response = self.execute(request).await?;

        let etag = response.header("etag").ok_or_else(|| {
            Error::Server(ErrorResponse::new(
                response.status,
                "InvalidResponse",
                format!("no ETag returned for part {}", part_number),
            ))
        })?;
        debug!("Uploaded part {} ({} bytes)", part_number, size);
        Ok(Part::new(part_number, etag, size))
    }

    pub(crate) async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[Part],
    ) -> Result<ObjectWriteResponse> {
        let request = S3Request::new(Method::POST, RequestTarget::object(bucket, key))
            .query("uploadId", upload_id)
            .header("content-type", "application/xml")
            .body(complete_multipart_upload_body(parts));
        let response = self.execute(request).await?;
        let result = parse_complete_multipart_upload(&response.body)?;

        info!("Completed upload {} of {}/{}", upload_id, bucket, key);
        Ok(ObjectWriteResponse {
            bucket: bucket.to_string(),
            key: key.to_string(),
            etag: result.etag,
            version_id: response.header(VERSION_ID_HEADER).map(String::from),
            upload_id: Some(upload_id.to_string()),
            part_count: parts.len() as u32,
            size: parts.iter().map(|p| p.size).sum(),
        })
    }

    pub async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<()> {
        validate_bucket_name(bucket)?;
        validate_object_name(key)?;
        let request = S3Request::new(Method::DELETE, RequestTarget::object(bucket, key))
            .query("uploadId", upload_id);
        self.execute(request).await?;
        info!("Aborted upload {} of {}/{}", upload_id, bucket, key);
        Ok(())
    }

    /// Abort every incomplete upload of `key`; returns how many were aborted
    pub async fn remove_incomplete_upload(&self, bucket: &str, key: &str) -> Result<usize> {
        validate_bucket_name(bucket)?;
        validate_object_name(key)?;

        let uploads = self.list_incomplete_uploads(bucket, Some(key)).collect().await?;
        let mut aborted = 0;
        for upload in uploads.iter().filter(|u| u.key == key) {
            self.abort_multipart_upload(bucket, key, &upload.upload_id)
                .await?;
            aborted += 1;
        }
        Ok(aborted)
    }
}
