//! Analysis orchestration.
//!
//! One run: normalize the URL, fetch the snapshot, classify the site,
//! evaluate the 12 metrics in canonical order, aggregate. Progress flows
//! through a bounded mpsc channel: exactly one event per completed
//! metric, then a single terminal `Complete` or `Error`. A dropped
//! consumer cancels the run between evaluations.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use url::Url;

use crate::domain::{AnalysisReport, MetricKey, ProgressEvent};
use crate::error::{AppError, Result};
use crate::service::aggregator::aggregate;
use crate::service::classifier::classify;
use crate::service::evaluator::{EvalContext, EvaluatorRegistry};
use crate::service::fetcher::{FetchOptions, HttpPageFetcher, PageFetcher};
use crate::service::weights::{profile_for, validate_profiles};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fetch_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            channel_capacity: 32,
        }
    }
}

/// Consumer end of one run's event stream.
pub struct ProgressChannel {
    rx: mpsc::Receiver<ProgressEvent>,
}

impl ProgressChannel {
    /// Next event, or `None` once the stream has ended.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Drop the consumer side, cancelling the producing run.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

pub struct AnalysisPipeline {
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<EvaluatorRegistry>,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    /// Build a pipeline over the live HTTP fetcher. Fails fast on a
    /// malformed weight table.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        validate_profiles()?;
        let fetcher = HttpPageFetcher::new(config.fetch_timeout)?;
        Ok(Self {
            fetcher: Arc::new(fetcher),
            registry: Arc::new(EvaluatorRegistry::standard()),
            config,
        })
    }

    /// Swap the fetch collaborator (tests, alternative transports).
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Swap the evaluator registry (fault-injection tests).
    pub fn with_registry(mut self, registry: EvaluatorRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Start a run and hand back its event stream. A valid URL spawns the
    /// run onto the current tokio runtime, so this must be called from
    /// within one; a rejected URL only buffers the error event.
    pub fn analyze(&self, raw_url: &str, full_site_analysis: bool) -> ProgressChannel {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));

        match normalize_url(raw_url) {
            Ok(url) => {
                let fetcher = Arc::clone(&self.fetcher);
                let registry = Arc::clone(&self.registry);
                let options = FetchOptions {
                    timeout: self.config.fetch_timeout,
                    full_site_analysis,
                };
                let fetch_timeout = self.config.fetch_timeout;

                tokio::spawn(async move {
                    run_analysis(fetcher, registry, url, options, fetch_timeout, tx).await;
                });
            }
            Err(e) => {
                log::warn!("[PIPELINE] Rejected URL {:?}: {}", raw_url, e);
                // A fresh channel always has room for the single event.
                let _ = tx.try_send(ProgressEvent::Error {
                    message: e.to_string(),
                });
            }
        }

        ProgressChannel { rx }
    }

    /// Run to completion, discarding progress events.
    pub async fn analyze_sync(
        &self,
        raw_url: &str,
        full_site_analysis: bool,
    ) -> Result<AnalysisReport> {
        let mut channel = self.analyze(raw_url, full_site_analysis);
        while let Some(event) = channel.next_event().await {
            match event {
                ProgressEvent::Progress { .. } => continue,
                ProgressEvent::Complete { data } => return Ok(*data),
                ProgressEvent::Error { message } => {
                    return Err(anyhow::anyhow!(message).into());
                }
            }
        }
        Err(AppError::Cancelled)
    }
}

async fn run_analysis(
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<EvaluatorRegistry>,
    url: Url,
    options: FetchOptions,
    fetch_timeout: Duration,
    tx: mpsc::Sender<ProgressEvent>,
) {
    log::info!("[PIPELINE] Starting analysis of {}", url);

    let snapshot = match tokio::time::timeout(fetch_timeout, fetcher.fetch(&url, &options)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            let _ = tx
                .send(ProgressEvent::Error {
                    message: e.to_string(),
                })
                .await;
            return;
        }
        Err(_) => {
            let _ = tx
                .send(ProgressEvent::Error {
                    message: format!("Fetching {} timed out", url),
                })
                .await;
            return;
        }
    };

    let website_type = classify(&snapshot);
    let profile = profile_for(website_type);
    log::info!(
        "[PIPELINE] {} classified as {}",
        url,
        website_type.as_str()
    );

    let ctx = EvalContext {
        url: &url,
        page: &snapshot,
        website_type,
    };

    let mut results = BTreeMap::new();
    for key in MetricKey::ALL {
        if tx.is_closed() {
            log::info!("[PIPELINE] Consumer gone, cancelling analysis of {}", url);
            return;
        }

        let result = registry.evaluate(key, &ctx);
        results.insert(key, result);

        let sent = tx
            .send(ProgressEvent::Progress {
                message: format!("Analyzing {}...", key.label()),
            })
            .await;
        if sent.is_err() {
            log::info!("[PIPELINE] Consumer gone, cancelling analysis of {}", url);
            return;
        }
    }

    let (total_score, status) = aggregate(&results, &profile);
    log::info!(
        "[PIPELINE] {} scored {}/120 ({})",
        url,
        total_score,
        status.as_str()
    );

    let report = AnalysisReport {
        url: url.to_string(),
        website_type,
        results,
        total_score,
        status,
    };
    let _ = tx
        .send(ProgressEvent::Complete {
            data: Box::new(report),
        })
        .await;
}

/// Repair and parse user-supplied URLs: trim, collapse repeated scheme
/// prefixes ("https://Https://x" happens with copy-pasted input), default
/// to https when no scheme is given.
pub fn normalize_url(input: &str) -> Result<Url> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidUrl("URL is empty".to_string()));
    }

    let mut rest = trimmed;
    let mut scheme = None;
    loop {
        let lower = rest.to_lowercase();
        if lower.starts_with("https://") {
            scheme = Some("https");
            rest = &rest["https://".len()..];
        } else if lower.starts_with("http://") {
            scheme = Some("http");
            rest = &rest["http://".len()..];
        } else {
            break;
        }
    }

    if rest.is_empty() {
        return Err(AppError::InvalidUrl(format!("No host in {:?}", input)));
    }

    let repaired = format!("{}://{}", scheme.unwrap_or("https"), rest);
    let url = Url::parse(&repaired)
        .map_err(|e| AppError::InvalidUrl(format!("{:?}: {}", input, e)))?;
    if url.host_str().is_none() {
        return Err(AppError::InvalidUrl(format!("No host in {:?}", input)));
    }
    Ok(url)
}
