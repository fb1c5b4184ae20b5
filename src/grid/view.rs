//! Grid view - page state, debounced re-render and page rendering

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::debounce::Debouncer;
use super::pagination::{PageButton, Paginator};
use crate::catalog::{Camera, CameraRecord};

/// Snapshot of what should be on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

/// One rendered page of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub cameras: Vec<Camera>,
    /// Records on this page missing a required field
    pub rejected: Vec<CameraRecord>,
    pub buttons: Vec<PageButton>,
}

/// Render `request` over `records`
pub fn render_page(records: &[CameraRecord], request: PageRequest) -> RenderedPage {
    let mut paginator = Paginator::new(records.len(), request.per_page);
    paginator.go_to(request.page);

    let mut cameras = Vec::new();
    let mut rejected = Vec::new();
    for record in paginator.current_slice(records) {
        match record.validate() {
            Some(camera) => cameras.push(camera),
            None => {
                warn!("Invalid camera record: {:?}", record);
                rejected.push(record.clone());
            }
        }
    }

    RenderedPage {
        page: paginator.current_page(),
        per_page: paginator.per_page(),
        total_pages: paginator.total_pages(),
        cameras,
        rejected,
        buttons: paginator.buttons(),
    }
}

/// Interactive grid state; every change schedules a debounced page request
pub struct GridView {
    records: Vec<CameraRecord>,
    paginator: Paginator,
    debouncer: Debouncer<PageRequest>,
}

impl GridView {
    pub fn new(
        records: Vec<CameraRecord>,
        per_page: usize,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<PageRequest>) {
        info!("Loaded {} cameras", records.len());
        let paginator = Paginator::new(records.len(), per_page);
        let (debouncer, receiver) = Debouncer::new(debounce);
        (
            Self {
                records,
                paginator,
                debouncer,
            },
            receiver,
        )
    }

    pub fn records(&self) -> &[CameraRecord] {
        &self.records
    }

    pub fn current_request(&self) -> PageRequest {
        PageRequest {
            page: self.paginator.current_page(),
            per_page: self.paginator.per_page(),
        }
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages()
    }

    /// Schedule a render of the current page
    pub fn refresh(&mut self) {
        let request = self.current_request();
        self.debouncer.trigger(request);
    }

    pub fn set_page_size(&mut self, per_page: usize) {
        self.paginator.set_per_page(per_page);
        info!("Page size changed to {}", self.paginator.per_page());
        self.refresh();
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.paginator.go_to(page);
        info!("Page changed to {}", self.paginator.current_page());
        self.refresh();
    }

    pub fn render(&self, request: PageRequest) -> RenderedPage {
        render_page(&self.records, request)
    }
}
