use anyhow::Result;
use reqwest::Client;

use std::path::PathBuf;

use crate::{
    archive::{ArchiveExtractor, Extractor},
    download::{Downloader, HttpDownloader},
    http::HttpClient,
    platform::{DefaultPlatformDetector, PlatformDetector},
    runtime::Runtime,
};

pub const USER_AGENT: &str = concat!("stratus-installer/", env!("STRATUS_INSTALLER_VERSION"));

pub struct Config<R: Runtime, D: Downloader, E: Extractor, P: PlatformDetector> {
    pub runtime: R,
    pub downloader: D,
    pub extractor: E,
    pub detector: P,
    pub bin_dir: Option<PathBuf>,
}

impl<R: Runtime> Config<R, HttpDownloader, ArchiveExtractor, DefaultPlatformDetector> {
    pub fn new(runtime: R, bin_dir: Option<PathBuf>) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;

        let http_client = HttpClient::new(client);
        let downloader = HttpDownloader::new(http_client);

        Ok(Self {
            runtime,
            downloader,
            extractor: ArchiveExtractor::new(),
            detector: DefaultPlatformDetector,
            bin_dir,
        })
    }
}
