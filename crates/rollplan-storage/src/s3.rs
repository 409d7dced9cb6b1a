use aws_sdk_s3::Client;
use aws_smithy_types::byte_stream::ByteStream;
use rollplan_core::NodePlan;

use crate::addr::PlanAddr;
use crate::codec;
use crate::error::StorageError;
use crate::record::PlanRecord;
use crate::store::{BoxFuture, PlanStore};

/// Plan store backed by an S3 bucket, one object per machine.
///
/// Writes are conditional on the ETag read just before: `If-Match` when a
/// record exists, `If-None-Match: *` when it does not. A concurrent writer
/// to the same machine surfaces as `StorageError::PreconditionFailed`.
#[derive(Debug, Clone)]
pub struct S3PlanStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3PlanStore {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Build a client from the default credential chain.
    pub async fn connect(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        region: Option<String>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), bucket, prefix)
    }

    pub fn key(&self, addr: &PlanAddr) -> Result<String, StorageError> {
        Ok(format!("{}{}", self.prefix, addr.object_key()?))
    }

    async fn fetch(
        &self,
        addr: &PlanAddr,
        key: &str,
    ) -> Result<Option<(PlanRecord, String)>, StorageError> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    return Ok(None);
                }
                return Err(StorageError::GetObject(err.to_string()));
            }
        };

        let etag = resp.e_tag().unwrap_or_default().to_string();
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StorageError::GetObject(e.to_string()))?
            .into_bytes();

        let record = codec::decode_for(addr, key, &body)?;
        Ok(Some((record, etag)))
    }
}

impl PlanStore for S3PlanStore {
    fn get<'a>(
        &'a self,
        addr: &'a PlanAddr,
    ) -> BoxFuture<'a, Result<Option<PlanRecord>, StorageError>> {
        Box::pin(async move {
            let key = self.key(addr)?;
            Ok(self.fetch(addr, &key).await?.map(|(record, _)| record))
        })
    }

    fn put<'a>(
        &'a self,
        addr: &'a PlanAddr,
        plan: &'a NodePlan,
        target_version: &'a str,
    ) -> BoxFuture<'a, Result<PlanRecord, StorageError>> {
        Box::pin(async move {
            let key = self.key(addr)?;
            let previous = self.fetch(addr, &key).await?;
            let record = PlanRecord::next(
                previous.as_ref().map(|(r, _)| r),
                addr,
                plan,
                target_version,
            );
            let body = codec::encode(&record)?;

            let mut req = self
                .client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .body(ByteStream::from(body))
                .content_type(codec::CONTENT_TYPE);

            req = match &previous {
                Some((_, etag)) => req.if_match(etag),
                None => req.if_none_match("*"),
            };

            req.send().await.map_err(|e| {
                let err = e.into_service_error();
                // S3 answers 412 when the condition doesn't hold
                if err.to_string().contains("PreconditionFailed") {
                    StorageError::PreconditionFailed { key: key.clone() }
                } else {
                    StorageError::PutObject(err.to_string())
                }
            })?;

            tracing::debug!(
                bucket = %self.bucket,
                key = %key,
                generation = record.generation,
                "plan flushed to S3"
            );
            Ok(record)
        })
    }

    fn delete<'a>(&'a self, addr: &'a PlanAddr) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let key = self.key(addr)?;
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| StorageError::DeleteObject(e.into_service_error().to_string()))?;
            tracing::debug!(bucket = %self.bucket, key = %key, "plan removed from S3");
            Ok(())
        })
    }
}
