//! # pdfium-auto
//!
//! Find a usable PDFium shared library for `pdfium-render`, downloading it
//! once into a per-user cache when none is available.
//!
//! Resolution order (first hit wins):
//!
//! 1. `PDFIUM_LIB_PATH`, when it names an existing file.
//! 2. `{cache}/pdfium-{PDFIUM_VERSION}/{libname}`, where `{cache}` is
//!    `PDFIUM_AUTO_CACHE_DIR` or the platform cache dir joined with
//!    `pdf2fields`.
//! 3. Download `pdfium-{os}-{arch}.tgz` from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries)
//!    and unpack the library into that cache path.
//!
//! ```rust,no_run
//! let pdfium = pdfium_auto::bind_pdfium_silent().expect("PDFium unavailable");
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// The pdfium-binaries release tag used for downloads.
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Cache namespace under the platform cache directory.
const CACHE_NAMESPACE: &str = "pdf2fields";

const LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";
const CACHE_DIR_ENV: &str = "PDFIUM_AUTO_CACHE_DIR";

/// Errors returned by pdfium-auto operations.
#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("No PDFium build published for {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Release asset for one OS/arch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Asset {
    os: &'static str,
    arch: &'static str,
    /// Archive name and the library's path inside it.
    archive: &'static str,
    member: &'static str,
}

impl Asset {
    fn lib_name(&self) -> &'static str {
        self.member.rsplit('/').next().unwrap_or(self.member)
    }
}

const ASSETS: &[Asset] = &[
    Asset { os: "macos", arch: "aarch64", archive: "pdfium-mac-arm64.tgz", member: "lib/libpdfium.dylib" },
    Asset { os: "macos", arch: "x86_64", archive: "pdfium-mac-x64.tgz", member: "lib/libpdfium.dylib" },
    Asset { os: "linux", arch: "x86_64", archive: "pdfium-linux-x64.tgz", member: "lib/libpdfium.so" },
    Asset { os: "linux", arch: "aarch64", archive: "pdfium-linux-arm64.tgz", member: "lib/libpdfium.so" },
    Asset { os: "windows", arch: "x86_64", archive: "pdfium-win-x64.tgz", member: "bin/pdfium.dll" },
    Asset { os: "windows", arch: "aarch64", archive: "pdfium-win-arm64.tgz", member: "bin/pdfium.dll" },
    Asset { os: "windows", arch: "x86", archive: "pdfium-win-x86.tgz", member: "bin/pdfium.dll" },
];

fn asset_for(os: &str, arch: &str) -> Result<Asset, PdfiumAutoError> {
    ASSETS
        .iter()
        .copied()
        .find(|a| a.os == os && a.arch == arch)
        .ok_or_else(|| PdfiumAutoError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        })
}

fn current_asset() -> Result<Asset, PdfiumAutoError> {
    asset_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Per-version cache directory for the PDFium library.
///
/// `PDFIUM_AUTO_CACHE_DIR` replaces the platform cache base when set.
pub fn pdfium_cache_dir() -> PathBuf {
    let base = match std::env::var_os(CACHE_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join(CACHE_NAMESPACE),
    };
    base.join(format!("pdfium-{PDFIUM_VERSION}"))
}

/// Library path from `PDFIUM_LIB_PATH` or the cache, without downloading.
pub fn cached_pdfium_path() -> Option<PathBuf> {
    if let Some(p) = env_override() {
        return Some(p);
    }
    let asset = current_asset().ok()?;
    let p = pdfium_cache_dir().join(asset.lib_name());
    p.exists().then_some(p)
}

/// True when [`ensure_pdfium_library`] would not touch the network.
pub fn is_pdfium_cached() -> bool {
    cached_pdfium_path().is_some()
}

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Make sure a PDFium library exists locally and return its path.
///
/// `on_progress` receives `(bytes_downloaded, total_bytes)` while a download
/// is in progress. The resolved path is memoised for the process lifetime.
pub fn ensure_pdfium_library(
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = match cached_pdfium_path() {
        Some(p) => p,
        None => download_to_cache(current_asset()?, on_progress)?,
    };

    Ok(RESOLVED_PATH.get_or_init(|| path).clone())
}

/// Bind to PDFium, downloading it first if necessary, without progress output.
pub fn bind_pdfium_silent() -> Result<Pdfium, PdfiumAutoError> {
    let path = ensure_pdfium_library(None)?;
    bind_pdfium_from_path(&path)
}

/// Bind to a PDFium library at an explicit `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn env_override() -> Option<PathBuf> {
    let p = PathBuf::from(std::env::var_os(LIB_PATH_ENV)?);
    p.exists().then_some(p)
}

fn download_to_cache(
    asset: Asset,
    on_progress: Option<&dyn Fn(u64, Option<u64>)>,
) -> Result<PathBuf, PdfiumAutoError> {
    let cache_dir = pdfium_cache_dir();
    std::fs::create_dir_all(&cache_dir).map_err(PdfiumAutoError::CacheDir)?;

    let url = format!("{RELEASE_URL}/chromium%2F{PDFIUM_VERSION}/{}", asset.archive);
    let archive = fetch(&url, on_progress)?;

    let dest = cache_dir.join(asset.lib_name());
    unpack_member(&archive, asset.member, &dest)?;
    Ok(dest)
}

fn fetch(url: &str, on_progress: Option<&dyn Fn(u64, Option<u64>)>) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(PdfiumAutoError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumAutoError::Download(format!("Read error: {e}"))),
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(cb) = on_progress {
            cb(buf.len() as u64, total);
        }
    }
    Ok(buf)
}

/// Copy `member` out of a gzipped tarball into `dest`.
fn unpack_member(archive: &[u8], member: &str, dest: &Path) -> Result<(), PdfiumAutoError> {
    let extract_err = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut tarball = tar::Archive::new(flate2::read::GzDecoder::new(archive));

    for entry in tarball.entries().map_err(extract_err)? {
        let mut entry = entry.map_err(extract_err)?;
        if entry.path().map_err(extract_err)?.as_ref() == Path::new(member) {
            entry.unpack(dest).map_err(extract_err)?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!(
        "'{member}' not found in archive"
    )))
}
