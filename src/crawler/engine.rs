use crate::captcha::CaptchaSolver;
use crate::crawler::{payload, rows, RunContext};
use crate::crawler::payload::Cursor;
use crate::metadata::{self, CaseRecord};
use crate::scheduler::{CrawlTask, DateWindow};
use crate::session::SessionClient;
use crate::storage::{is_pdf, remote_keys, ArtifactPaths};
use crate::{courts, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Terminal state of one window crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// The window's result set was paginated to exhaustion and progress was
    /// recorded
    Completed,
    /// A shutdown request stopped the crawl before exhaustion; progress was
    /// deliberately left untouched
    Interrupted,
}

/// What happened to one result row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowOutcome {
    /// PDF fetched, validated, and persisted
    Downloaded,
    /// Artifacts for this fragment already exist locally
    AlreadyPresent,
    /// Row carries no resolvable document reference
    NoDocument,
    /// The resolved payload was not a PDF, or the link yielded no file;
    /// recorded with `downloaded = false`
    Rejected,
}

/// Drives one crawl task to completion
///
/// Owns the task's session exclusively. Pages are fetched in cursor order;
/// rows are handled in array order; after a configured number of rows that
/// exercised the PDF protocol, the session is re-initialized mid-page and the
/// same page offset is reissued, which the idempotent skip check makes cheap.
pub struct PaginationEngine {
    ctx: Arc<RunContext>,
    client: SessionClient,
    court_code: String,
    court_name: String,
    court_slug: String,
}

impl PaginationEngine {
    /// Builds an engine with a fresh session for one task's court
    pub fn for_task(ctx: Arc<RunContext>, court_code: &str) -> Result<Self> {
        let court_name = ctx.registry.resolve(court_code)?.to_string();
        let court_slug = courts::slugify(&court_name);

        let solver = CaptchaSolver::new(
            ctx.recognizer.clone(),
            ctx.endpoints.captcha_image.clone(),
            ctx.config.output.captcha_tmp_dir.clone(),
            ctx.config.crawl.captcha_attempts,
            court_code,
        );
        let client = SessionClient::new(
            ctx.endpoints.clone(),
            solver,
            ctx.config.crawl.refresh_attempts,
            Duration::from_secs(ctx.config.crawl.request_timeout_secs),
        )?;

        Ok(Self {
            ctx,
            client,
            court_code: court_code.to_string(),
            court_name,
            court_slug,
        })
    }

    /// Crawls one date window to exhaustion
    ///
    /// Progress for the court is advanced to the window's end date only when
    /// the server returns an empty result page; any earlier exit leaves the
    /// progress record unchanged so a later run re-fetches from a safe point.
    pub async fn run(&mut self, task: &CrawlTask) -> Result<WindowOutcome> {
        let window = &task.window;
        tracing::info!("Processing {} {}", self.court_code, window);

        self.client.initialize().await?;

        let page_size = self.ctx.config.crawl.page_size;
        let mut form = payload::search_form(&self.court_code, window, page_size);
        let mut cursor = Cursor::start();
        let mut rows_since_reset = 0u32;
        let mut downloaded = 0u64;
        let mut skipped = 0u64;
        let mut failed = 0u64;

        loop {
            if self.ctx.shutdown_requested() {
                tracing::warn!("Shutdown requested, abandoning {} {}", self.court_code, window);
                return Ok(WindowOutcome::Interrupted);
            }

            cursor.apply(&mut form);
            let body = self
                .client
                .request(&self.ctx.endpoints.search, &mut form)
                .await?;
            let page = rows::page_rows(&body).to_vec();

            if page.is_empty() {
                self.ctx
                    .tracker
                    .update(&self.court_code, window.to)
                    .await?;
                tracing::info!(
                    "Window {} {} exhausted: {} downloaded, {} skipped, {} failed",
                    self.court_code,
                    window,
                    downloaded,
                    skipped,
                    failed
                );
                return Ok(WindowOutcome::Completed);
            }

            tracing::debug!(
                "Page echo={} offset={} carries {} rows",
                cursor.echo,
                cursor.offset,
                page.len()
            );

            let mut reset_mid_page = false;
            for (index, row) in page.iter().enumerate() {
                if self.ctx.shutdown_requested() {
                    tracing::warn!(
                        "Shutdown requested, abandoning {} {}",
                        self.court_code,
                        window
                    );
                    return Ok(WindowOutcome::Interrupted);
                }

                match self.handle_row(row, index, window).await {
                    Ok(RowOutcome::Downloaded) => {
                        downloaded += 1;
                        rows_since_reset += 1;
                    }
                    Ok(RowOutcome::Rejected) => {
                        rows_since_reset += 1;
                    }
                    Ok(RowOutcome::AlreadyPresent) => skipped += 1,
                    Ok(RowOutcome::NoDocument) => {}
                    Err(e) => {
                        // Row-scoped failures never abort the window.
                        failed += 1;
                        tracing::error!(
                            "Row {} of {} {} failed: {}",
                            index,
                            self.court_code,
                            window,
                            e
                        );
                    }
                }

                if rows_since_reset >= self.ctx.config.crawl.session_reset_rows {
                    tracing::info!(
                        "Resetting session for {} after {} rows",
                        self.court_code,
                        rows_since_reset
                    );
                    self.client.initialize().await?;
                    rows_since_reset = 0;
                    reset_mid_page = true;
                    break;
                }
            }

            // A reset reissues the same offset with the fresh session; the
            // already-persisted rows of this page fall through the skip check.
            if !reset_mid_page {
                cursor.advance(page_size);
            }
        }
    }

    /// Handles one result row: resolve, skip-if-present, download, record
    async fn handle_row(
        &mut self,
        row: &Value,
        row_index: usize,
        window: &DateWindow,
    ) -> Result<RowOutcome> {
        let Some(markup) = rows::row_markup(row) else {
            tracing::debug!("Row {} carries no markup payload", row_index);
            return Ok(RowOutcome::NoDocument);
        };
        let Some(fragment) = rows::extract_fragment(markup) else {
            tracing::debug!("Row {} has no document fragment", row_index);
            return Ok(RowOutcome::NoDocument);
        };

        let paths = ArtifactPaths::derive(
            &self.ctx.config.output.data_dir,
            &self.court_code,
            &self.court_slug,
            &fragment,
            window,
        )?;

        if paths.already_recorded() {
            tracing::debug!("Skipping already recorded document: {}", fragment);
            return Ok(RowOutcome::AlreadyPresent);
        }

        // Resolve the PDF link; the session client absorbs any embedded
        // challenge the server attaches to this call.
        let mut link_form = payload::pdf_link_form(&fragment, row_index);
        let link_body = self
            .client
            .request(&self.ctx.endpoints.pdf_link, &mut link_form)
            .await?;

        let mut downloaded = false;
        match link_body.get("outputfile").and_then(Value::as_str) {
            Some(output_file) => {
                let url = self.ctx.endpoints.root.join(output_file)?;
                let bytes = self.client.fetch_bytes(&url).await?;
                if is_pdf(&bytes) {
                    paths.write_pdf(&bytes).await?;
                    downloaded = true;
                } else {
                    tracing::error!("Discarding non-PDF payload for {}", fragment);
                }
            }
            None => {
                tracing::error!("No output file in PDF-link response for {}", fragment);
            }
        }

        let mut record = CaseRecord::new(
            metadata::extract(markup),
            &self.court_code,
            &self.court_name,
            &fragment,
            downloaded,
            window,
        );
        paths.write_metadata(&record).await?;

        self.push_remote(&paths, &mut record, downloaded).await;

        Ok(if downloaded {
            RowOutcome::Downloaded
        } else {
            RowOutcome::Rejected
        })
    }

    /// Best-effort upload of the row's artifacts; failures only log
    async fn push_remote(&self, paths: &ArtifactPaths, record: &mut CaseRecord, downloaded: bool) {
        let Some(store) = self.ctx.object_store.as_ref() else {
            return;
        };
        if !self.ctx.config.upload.enabled {
            return;
        }

        let (pdf_key, meta_key) =
            remote_keys(&self.ctx.config.upload.prefix, &self.court_slug, paths);

        if downloaded {
            match store.upload(&paths.pdf, &pdf_key).await {
                Ok(url) => {
                    record.remote_pdf_key = Some(pdf_key.clone());
                    record.pdf_url = Some(url);
                    // Refresh the local record with the upload provenance.
                    if let Err(e) = paths.write_metadata(record).await {
                        tracing::error!("Failed to rewrite metadata after upload: {}", e);
                    }
                }
                Err(e) => {
                    tracing::error!("PDF upload failed for {}: {}", pdf_key, e);
                    return;
                }
            }
        }

        if let Err(e) = store.upload(&paths.metadata, &meta_key).await {
            tracing::error!("Metadata upload failed for {}: {}", meta_key, e);
        }
    }
}
