// Transmission Encoder/Sender: formats reports for the configured mode and
// hands them to the transport.

use std::sync::Arc;

use tracing::{debug, trace};
use url::Url;

use crate::codec::encode_cmcd;
use crate::config::{CmcdConfig, TransmissionMode};
use crate::report::{CmcdReport, keys};
use crate::transmit::batch::BatchBuffer;
use crate::transmit::transport::{ReportRequest, ReportTransport};
use crate::value::CmcdFields;
use crate::CmcdError;

pub struct ReportSender {
    endpoint: Url,
    mode: TransmissionMode,
    batch: BatchBuffer,
    transport: Arc<dyn ReportTransport>,
}

impl ReportSender {
    pub fn new(
        config: &CmcdConfig,
        transport: Arc<dyn ReportTransport>,
    ) -> Result<Self, CmcdError> {
        Ok(Self {
            endpoint: config.endpoint()?,
            mode: config.transmission_mode,
            batch: BatchBuffer::new(config.batch_size),
            transport,
        })
    }

    /// Buffers or sends `report` depending on the transmission mode.
    pub fn submit(&mut self, report: CmcdReport) -> Result<(), CmcdError> {
        if report.is_empty() {
            trace!("Skipping empty CMCD report");
            return Ok(());
        }

        match self.mode {
            TransmissionMode::Json => {
                if let Some(batch) = self.batch.push(report.fields) {
                    let body = encode_json_batch(&batch)?;
                    debug!(reports = batch.len(), "Flushing CMCD batch");
                    self.transport.dispatch(ReportRequest::Post {
                        url: self.endpoint.clone(),
                        body,
                    });
                }
            }
            TransmissionMode::Query => {
                let url = query_url(&self.endpoint, &report.fields);
                trace!(url = %url, "Sending CMCD query report");
                self.transport.dispatch(ReportRequest::Get { url });
            }
        }
        Ok(())
    }

    pub fn buffered(&self) -> usize {
        self.batch.len()
    }

    /// Drops any partially filled batch.
    pub fn discard_pending(&mut self) -> usize {
        self.batch.discard()
    }
}

/// Serializes a batch to a JSON array of report objects.
pub fn encode_json_batch(batch: &[CmcdFields]) -> Result<String, CmcdError> {
    Ok(serde_json::to_string(batch)?)
}

/// Returns `endpoint` with its `CMCD` parameter set to the encoded report.
/// Other query parameters are preserved.
pub fn query_url(endpoint: &Url, fields: &CmcdFields) -> Url {
    let mut url = endpoint.clone();
    let kept: Vec<(String, String)> = endpoint
        .query_pairs()
        .filter(|(name, _)| name != keys::QUERY_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(keys::QUERY_PARAM, &encode_cmcd(fields));
    url
}
