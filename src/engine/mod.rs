//! Session engine: owns all ambient client state (connection, location,
//! listing snapshot) and executes user commands against it.
//!
//! Presentation is a projection of what the engine returns; nothing here
//! prints or draws.

pub mod aggregate;
pub mod flatten;
pub mod nav;
pub mod progress;
pub mod transfer;

use crate::common::config::TransferSettings;
use crate::common::errors::ClientError;
use crate::remote::{AggregateResult, DriveItem, RemoteDrive, SelectionItem};
use anyhow::{bail, ensure, Context, Result};
use flatten::{flatten_entries, roots_from_paths, ChildLister};
use nav::{Location, Navigator};
use progress::ProgressTracker;
use std::path::PathBuf;
use std::sync::Arc;
use transfer::{BatchReport, TransferOrchestrator};

/// One user action, as a value.
#[derive(Debug, Clone)]
pub enum Command {
    Connect { token: String },
    Enter { name: String },
    Leave,
    Refresh,
    Upload { paths: Vec<PathBuf> },
    Mkdir { name: String },
    Delete { name: String },
    DirectLink { name: String },
    AggregateLinks { names: Vec<String>, target_path: String },
}

/// What a command produced, for the presentation layer to render.
#[derive(Debug, Clone)]
pub enum Outcome {
    Connected { path: String, count: usize },
    Listing { path: String, items: Vec<DriveItem> },
    Uploaded { report: BatchReport },
    UploadedOne { name: String, fid: String },
    Created { name: String },
    Deleted { name: String },
    Link { name: String, url: String },
    Aggregated { result: AggregateResult },
}

pub struct Engine {
    remote: Arc<dyn RemoteDrive>,
    lister: Arc<dyn ChildLister>,
    navigator: Navigator,
    listing: Vec<DriveItem>,
    connected: bool,
    orchestrator: TransferOrchestrator,
}

impl Engine {
    pub fn new(
        remote: Arc<dyn RemoteDrive>,
        lister: Arc<dyn ChildLister>,
        settings: TransferSettings,
    ) -> Self {
        let orchestrator = TransferOrchestrator::new(remote.clone(), settings.settle_delay());
        Self {
            remote,
            lister,
            navigator: Navigator::default(),
            listing: Vec::new(),
            connected: false,
            orchestrator,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn path(&self) -> String {
        self.navigator.path()
    }

    pub fn listing(&self) -> &[DriveItem] {
        &self.listing
    }

    /// Tracker of the upload currently (or last) running, for live display.
    pub fn progress(&self) -> Arc<ProgressTracker> {
        self.orchestrator.tracker()
    }

    pub async fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Connect { token } => self.connect(&token).await,
            Command::Enter { name } => self.enter(&name).await,
            Command::Leave => self.leave().await,
            Command::Refresh => self.refresh().await,
            Command::Upload { paths } => self.upload(&paths).await,
            Command::Mkdir { name } => self.mkdir(&name).await,
            Command::Delete { name } => self.delete(&name).await,
            Command::DirectLink { name } => self.direct_link(&name).await,
            Command::AggregateLinks { names, target_path } => {
                self.aggregate(&names, &target_path).await
            }
        }
    }

    async fn connect(&mut self, token: &str) -> Result<Outcome> {
        ensure!(!token.trim().is_empty(), "No access token configured");

        let info = self.remote.connect(token).await?;
        self.navigator = Navigator::new(Location::new(info.current_location_id, "/"));
        self.listing = info.files;
        self.connected = true;
        tracing::info!("connected, starting at '{}'", info.current_path);

        Ok(Outcome::Connected {
            path: self.navigator.path(),
            count: self.listing.len(),
        })
    }

    async fn enter(&mut self, name: &str) -> Result<Outcome> {
        self.require_connected()?;
        let item = self.find_item(name)?;
        ensure!(item.is_container, "'{name}' is not a folder");

        let child = Location::new(item.id.clone(), item.name.clone());
        self.navigator.enter(child);
        self.fetch_listing().await?;
        Ok(self.listing_outcome())
    }

    async fn leave(&mut self) -> Result<Outcome> {
        self.require_connected()?;
        // Popping an empty history is a no-op, not an error, and issues no
        // fetch; the displayed listing simply stays.
        if self.navigator.leave().is_some() {
            self.fetch_listing().await?;
        }
        Ok(self.listing_outcome())
    }

    async fn refresh(&mut self) -> Result<Outcome> {
        self.require_connected()?;
        self.fetch_listing().await?;
        Ok(self.listing_outcome())
    }

    async fn upload(&mut self, paths: &[PathBuf]) -> Result<Outcome> {
        self.require_connected()?;
        ensure!(!paths.is_empty(), "No files given");

        let roots = roots_from_paths(paths).await?;
        let files = flatten_entries(self.lister.clone(), roots).await;
        ensure!(!files.is_empty(), "Nothing to upload");

        let target_id = self.navigator.current().id.clone();

        // A lone file with no directory component is the single-file path:
        // per-byte progress and a direct error instead of a batch report.
        if files.len() == 1 && !files[0].relative_path.contains('/') {
            let file = files[0].clone();
            let fid = self.orchestrator.upload_one(&file, &target_id).await?;
            self.settle_and_refresh().await;
            return Ok(Outcome::UploadedOne {
                name: file.relative_path,
                fid,
            });
        }

        let report = self.orchestrator.upload_batch(&files, &target_id).await;
        if report.is_fatal() {
            return Err(ClientError::BatchFailed(report.total).into());
        }
        if report.succeeded > 0 {
            self.settle_and_refresh().await;
        }
        Ok(Outcome::Uploaded { report })
    }

    async fn mkdir(&mut self, name: &str) -> Result<Outcome> {
        self.require_connected()?;
        ensure!(!name.trim().is_empty(), "Folder name must not be empty");

        let parent = self.navigator.current().id.clone();
        self.remote.create_container(name, &parent).await?;
        self.fetch_listing()
            .await
            .context("Folder created, but refreshing the listing failed")?;
        Ok(Outcome::Created {
            name: name.to_string(),
        })
    }

    async fn delete(&mut self, name: &str) -> Result<Outcome> {
        self.require_connected()?;
        let item = self.find_item(name)?;
        let (id, is_container, name) = (item.id.clone(), item.is_container, item.name.clone());

        self.remote.delete(&id, is_container).await?;
        self.fetch_listing()
            .await
            .context("Item deleted, but refreshing the listing failed")?;
        Ok(Outcome::Deleted { name })
    }

    async fn direct_link(&mut self, name: &str) -> Result<Outcome> {
        self.require_connected()?;
        let item = self.find_item(name)?;
        ensure!(!item.is_container, "'{name}' is a folder, pick a file");

        let fid = item.fid.clone();
        let name = item.name.clone();
        let url = self.remote.direct_link(&fid).await?;
        Ok(Outcome::Link { name, url })
    }

    async fn aggregate(&mut self, names: &[String], target_path: &str) -> Result<Outcome> {
        self.require_connected()?;

        let mut selection = Vec::new();
        for name in names {
            let item = self.find_item(name)?;
            ensure!(!item.is_container, "'{name}' is a folder, pick files only");
            selection.push(SelectionItem {
                fid: item.fid.clone(),
                id: item.id.clone(),
                name: item.name.clone(),
            });
        }

        let result =
            aggregate::aggregate_selection(self.remote.as_ref(), &selection, target_path).await?;
        Ok(Outcome::Aggregated { result })
    }

    fn require_connected(&self) -> Result<()> {
        ensure!(self.connected, "Not connected, run `connect` first");
        Ok(())
    }

    fn find_item(&self, name: &str) -> Result<&DriveItem> {
        match self.listing.iter().find(|item| item.name == name) {
            Some(item) => Ok(item),
            None => bail!("No item named '{name}' in the current folder"),
        }
    }

    async fn fetch_listing(&mut self) -> Result<()> {
        let items = self.remote.list(&self.navigator.current().id).await?;
        self.listing = items;
        Ok(())
    }

    fn listing_outcome(&self) -> Outcome {
        Outcome::Listing {
            path: self.navigator.path(),
            items: self.listing.clone(),
        }
    }

    /// Post-upload refresh: wait out the service's visibility window, then
    /// re-list. A refresh failure here must not turn a finished upload into
    /// an error; it is reported once through the log.
    async fn settle_and_refresh(&mut self) {
        self.orchestrator.settle().await;
        if let Err(err) = self.fetch_listing().await {
            tracing::warn!("post-upload refresh failed: {err:#}");
        }
    }
}
