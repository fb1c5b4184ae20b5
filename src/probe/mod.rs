//! Headless probe - render one grid page and load every card's stream

mod media;
mod session;

pub use media::HeadlessMedia;
pub use session::{probe_manifest, HttpManifestEngine, HttpManifestSession};

use anyhow::{anyhow, Result};
use futures::future::join_all;
use tracing::info;

use crate::catalog::CameraRecord;
use crate::config::Config;
use crate::grid::{CameraCard, CardStatus, GridView};
use crate::player::StreamingEngine;

/// Final state of one probed card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub id_user: String,
    pub name: String,
    pub stream_url: String,
    pub status: CardStatus,
    /// Load attempts made; zero when the engine path was not taken
    pub attempts: u32,
}

/// Summary of a probed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSummary {
    pub page: usize,
    pub total_pages: usize,
    pub results: Vec<ProbeResult>,
    pub rejected: usize,
}

impl ProbeSummary {
    pub fn live_count(&self) -> usize {
        self.results.iter().filter(|r| !r.status.is_error).count()
    }
}

/// Render `page` of `records` and mount every card on one task
pub async fn run_probe<E>(
    config: &Config,
    engine: &E,
    records: Vec<CameraRecord>,
    page: usize,
    per_page: usize,
) -> Result<ProbeSummary>
where
    E: StreamingEngine,
{
    let (mut view, mut requests) = GridView::new(records, per_page, config.debounce());
    view.go_to_page(page);
    let request = requests
        .recv()
        .await
        .ok_or_else(|| anyhow!("Grid closed before rendering"))?;
    let rendered = view.render(request);

    info!(
        "Probing page {}/{} ({} cameras, {} rejected)",
        rendered.page,
        rendered.total_pages,
        rendered.cameras.len(),
        rendered.rejected.len()
    );

    let policy = config.retry_policy();
    let medias: Vec<HeadlessMedia> = rendered
        .cameras
        .iter()
        .map(|_| HeadlessMedia::new())
        .collect();
    let mut cards: Vec<CameraCard<E::Session>> = rendered
        .cameras
        .iter()
        .cloned()
        .map(CameraCard::new)
        .collect();

    let jobs: Vec<_> = cards
        .iter_mut()
        .zip(&medias)
        .map(|(card, media)| card.mount(engine, media))
        .collect();

    let reports = join_all(jobs.into_iter().zip(&medias).map(|(job, media)| {
        let policy = &policy;
        async move {
            match job {
                Some(job) => Some(job.run(media, policy).await),
                None => None,
            }
        }
    }))
    .await;

    let results = cards
        .iter()
        .zip(reports)
        .map(|(card, report)| ProbeResult {
            id_user: card.camera().id_user.clone(),
            name: card.title().to_string(),
            stream_url: card.camera().stream_url.clone(),
            status: card.status(),
            attempts: report.map(|r| r.attempts).unwrap_or(0),
        })
        .collect();

    for card in cards.iter_mut() {
        card.cleanup();
    }

    Ok(ProbeSummary {
        page: rendered.page,
        total_pages: rendered.total_pages,
        results,
        rejected: rendered.rejected.len(),
    })
}
