//! Forward-only pagers over multipart listings
//!
//! A pager holds one page in memory and requests the next page only when the
//! buffered one is drained.

use std::collections::VecDeque;

use futures::stream::{self, Stream};
use http::Method;

use tessera_core::types::{PartInfo, UploadInfo};
use tessera_core::{Error, Result};

use crate::client::{S3Client, S3Request};
use crate::response::RequestTarget;
use crate::xml::{parse_list_multipart_uploads, parse_list_parts, ListPartsPage, ListUploadsPage};

const MAX_PARTS_PER_PAGE: u32 = 1000;
const MAX_UPLOADS_PER_PAGE: u32 = 1000;

impl S3Client {
    pub(crate) async fn list_parts_page(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number_marker: Option<u32>,
    ) -> Result<ListPartsPage> {
        let mut request = S3Request::new(Method::GET, RequestTarget::object(bucket, key))
            .query("uploadId", upload_id)
            .query("max-parts", MAX_PARTS_PER_PAGE.to_string());
        if let Some(marker) = part_number_marker {
            request = request.query("part-number-marker", marker.to_string());
        }
        let response = self.execute(request).await?;
        parse_list_parts(&response.body)
    }

    pub(crate) async fn list_uploads_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        key_marker: Option<&str>,
        upload_id_marker: Option<&str>,
    ) -> Result<ListUploadsPage> {
        let mut request = S3Request::new(Method::GET, RequestTarget::bucket(bucket))
            .query("uploads", "")
            .query("max-uploads", MAX_UPLOADS_PER_PAGE.to_string());
        if let Some(prefix) = prefix {
            request = request.query("prefix", prefix);
        }
        if let Some(marker) = key_marker {
            request = request.query("key-marker", marker);
        }
        if let Some(marker) = upload_id_marker {
            request = request.query("upload-id-marker", marker);
        }
        let response = self.execute(request).await?;
        parse_list_multipart_uploads(&response.body)
    }
}

/// Parts already stored for one upload, in part-number order
pub struct ListPartsPager<'a> {
    client: &'a S3Client,
    bucket: String,
    key: String,
    upload_id: String,
    buffer: VecDeque<PartInfo>,
    marker: Option<u32>,
    done: bool,
}

impl<'a> ListPartsPager<'a> {
    pub(crate) fn new(client: &'a S3Client, bucket: &str, key: &str, upload_id: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            buffer: VecDeque::new(),
            marker: None,
            done: false,
        }
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub async fn next(&mut self) -> Result<Option<PartInfo>> {
        if self.buffer.is_empty() && !self.done {
            self.fetch().await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn fetch(&mut self) -> Result<()> {
        let page = self
            .client
            .list_parts_page(&self.bucket, &self.key, &self.upload_id, self.marker)
            .await?;

        // some servers omit the marker on truncated pages
        let marker = page
            .next_part_number_marker
            .or_else(|| page.parts.last().map(|p| p.part_number));
        self.done = !page.is_truncated || page.parts.is_empty() || marker.is_none();
        self.marker = marker;
        self.buffer.extend(page.parts);
        Ok(())
    }

    /// Drain the remaining parts
    pub async fn collect(mut self) -> Result<Vec<PartInfo>> {
        let mut parts = Vec::new();
        while let Some(part) = self.next().await? {
            parts.push(part);
        }
        Ok(parts)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<PartInfo>> + 'a {
        stream::try_unfold(self, |mut pager| async move {
            Ok::<_, Error>(pager.next().await?.map(|part| (part, pager)))
        })
    }
}

/// Incomplete uploads of a bucket, in key then initiation order
pub struct ListUploadsPager<'a> {
    client: &'a S3Client,
    bucket: String,
    prefix: Option<String>,
    buffer: VecDeque<UploadInfo>,
    key_marker: Option<String>,
    upload_id_marker: Option<String>,
    done: bool,
}

impl<'a> ListUploadsPager<'a> {
    pub(crate) fn new(client: &'a S3Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            prefix: None,
            buffer: VecDeque::new(),
            key_marker: None,
            upload_id_marker: None,
            done: false,
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    pub async fn next(&mut self) -> Result<Option<UploadInfo>> {
        if self.buffer.is_empty() && !self.done {
            self.fetch().await?;
        }
        Ok(self.buffer.pop_front())
    }

    async fn fetch(&mut self) -> Result<()> {
        let page = self
            .client
            .list_uploads_page(
                &self.bucket,
                self.prefix.as_deref(),
                self.key_marker.as_deref(),
                self.upload_id_marker.as_deref(),
            )
            .await?;

        let key_marker = page
            .next_key_marker
            .or_else(|| page.uploads.last().map(|u| u.key.clone()));
        let upload_id_marker = page
            .next_upload_id_marker
            .or_else(|| page.uploads.last().map(|u| u.upload_id.clone()));

        self.done = !page.is_truncated || page.uploads.is_empty() || key_marker.is_none();
        self.key_marker = key_marker;
        self.upload_id_marker = upload_id_marker;
        self.buffer.extend(page.uploads);
        Ok(())
    }

    pub async fn collect(mut self) -> Result<Vec<UploadInfo>> {
        let mut uploads = Vec::new();
        while let Some(upload) = self.next().await? {
            uploads.push(upload);
        }
        Ok(uploads)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<UploadInfo>> + 'a {
        stream::try_unfold(self, |mut pager| async move {
            Ok::<_, Error>(pager.next().await?.map(|upload| (upload, pager)))
        })
    }
}
