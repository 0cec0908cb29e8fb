use crate::models::ApiImage;

use super::ClientError;

/// Image list as the gallery views see it.
///
/// `latest_request` is the sequence number of the most recently issued list
/// fetch. A response is committed only while its number is still the latest,
/// so overlapping searches resolve last-writer-wins.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryState {
    pub images: Vec<ApiImage>,
    pub loading: bool,
    pub error: Option<String>,
    latest_request: u64,
}

/// What the detail view shows for a given image id.
#[derive(Debug, PartialEq)]
pub enum DetailView<'a> {
    Loading,
    Failed,
    NotFound,
    Found(&'a ApiImage),
}

impl Default for GalleryState {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryState {
    /// Nothing fetched yet, so the views start in their loading state.
    pub fn new() -> Self {
        Self {
            images: Vec::new(),
            loading: true,
            error: None,
            latest_request: 0,
        }
    }

    /// Tags a new list fetch and returns its sequence number.
    pub fn begin_request(&mut self) -> u64 {
        self.latest_request += 1;
        self.loading = true;
        self.latest_request
    }

    pub fn is_latest(&self, request: u64) -> bool {
        request == self.latest_request
    }

    /// Applies a list response. Returns `false` for stale responses, which are dropped.
    pub fn commit(&mut self, request: u64, result: Result<Vec<ApiImage>, ClientError>) -> bool {
        if !self.is_latest(request) {
            return false;
        }

        self.loading = false;
        match result {
            Ok(images) => {
                self.images = images;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        true
    }

    pub fn detail(&self, id: &str) -> DetailView<'_> {
        if self.loading {
            return DetailView::Loading;
        }
        if self.error.is_some() {
            return DetailView::Failed;
        }
        match self.images.iter().find(|img| img.id == id) {
            Some(image) => DetailView::Found(image),
            None => DetailView::NotFound,
        }
    }

    /// Sets a new name locally and returns the one it replaced.
    pub fn rename_local(&mut self, id: &str, name: &str) -> Option<String> {
        self.images
            .iter_mut()
            .find(|img| img.id == id)
            .map(|img| std::mem::replace(&mut img.name, name.to_string()))
    }

    /// Restores `previous` unless the name no longer holds the optimistic value.
    pub fn rollback_rename(&mut self, id: &str, optimistic: &str, previous: String) -> bool {
        match self.images.iter_mut().find(|img| img.id == id) {
            Some(img) if img.name == optimistic => {
                img.name = previous;
                true
            }
            _ => false,
        }
    }
}
