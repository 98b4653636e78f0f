//! Kernel downloads from JPL and NAIF
//!
//! Files are streamed to a `.part` sibling and renamed into place once
//! complete, so an interrupted download never leaves a truncated kernel
//! under the final name.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::Config;
use crate::{Result, SpiceToolsError};

/// Check if a file exists and is not empty
fn file_exists_and_not_empty<P: AsRef<Path>>(path: P) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// Append `.bsp` unless already present
pub fn de_file_name(dename: &str) -> String {
    if dename.ends_with(".bsp") {
        dename.to_string()
    } else {
        format!("{}.bsp", dename)
    }
}

/// URL of a planetary ephemeris on the JPL server
pub fn de_url(config: &Config, dename: &str) -> String {
    format!(
        "{}/{}",
        config.de_base_url.trim_end_matches('/'),
        de_file_name(dename)
    )
}

/// URL of a file below NAIF `generic_kernels/`
pub fn generic_kernel_url(config: &Config, relpath: &str) -> String {
    format!(
        "{}/{}",
        config.naif_generic_url.trim_end_matches('/'),
        relpath.trim_start_matches('/')
    )
}

/// `.part` sibling that receives the data before the final rename
fn partial_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.part", file_name))
}

/// Stream `reader` into `path` through its `.part` file
///
/// The partial file is removed whenever copying, flushing or the final
/// rename fails.
fn write_atomically<R: Read>(reader: &mut R, path: &Path) -> Result<u64> {
    let temp_path = partial_path(path);
    let result = File::create(&temp_path).and_then(|file| {
        let mut file = BufWriter::new(file);
        let bytes = io::copy(reader, &mut file)?;
        file.flush()?;
        drop(file);
        fs::rename(&temp_path, path)?;
        Ok(bytes)
    });
    if result.is_err() && temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    Ok(result?)
}

/// Download a file from URL to a local path
fn download_file<P: AsRef<Path>>(config: &Config, url: &str, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    info!("Downloading {} to {}", url, path.display());
    let mut response = config.http_client()?.get(url).send()?;
    if !response.status().is_success() {
        return Err(SpiceToolsError::ServiceError(format!(
            "Failed to download {}, status: {}",
            url,
            response.status()
        )));
    }

    let bytes = write_atomically(&mut response, path)?;
    info!("Downloaded {} bytes to {}", bytes, path.display());
    Ok(())
}

/// Download a JPL planetary ephemeris such as `de440s`
///
/// Without `output` the file lands in the configured kernel directory as
/// `<dename>.bsp`. An existing file is returned untouched unless
/// `overwrite` is set.
pub fn download_jpl_de(dename: &str, output: Option<&Path>, overwrite: bool) -> Result<PathBuf> {
    download_jpl_de_with(&Config::load()?, dename, output, overwrite)
}

/// [`download_jpl_de`] with an explicit configuration
pub fn download_jpl_de_with(
    config: &Config,
    dename: &str,
    output: Option<&Path>,
    overwrite: bool,
) -> Result<PathBuf> {
    if dename.trim().is_empty() {
        return Err(SpiceToolsError::InvalidParameter(
            "Ephemeris name must not be empty".to_string(),
        ));
    }
    let output = match output {
        Some(path) => path.to_path_buf(),
        None => config.kernel_dir.join(de_file_name(dename)),
    };

    if file_exists_and_not_empty(&output) && !overwrite {
        debug!("Using existing {}", output.display());
        return Ok(output);
    }

    download_file(config, &de_url(config, dename), &output)?;
    Ok(output)
}

/// Download a NAIF generic kernel such as `lsk/naif0012.tls`
///
/// The file is stored under the same relative path inside the kernel
/// directory, which matches `$KERNELS/lsk/naif0012.tls` in meta-kernels.
pub fn download_generic_kernel(relpath: &str, overwrite: bool) -> Result<PathBuf> {
    download_generic_kernel_with(&Config::load()?, relpath, overwrite)
}

/// [`download_generic_kernel`] with an explicit configuration
pub fn download_generic_kernel_with(config: &Config, relpath: &str, overwrite: bool) -> Result<PathBuf> {
    let relative = relpath.trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|part| part == "..") {
        return Err(SpiceToolsError::InvalidParameter(format!(
            "Invalid generic kernel path {:?}",
            relpath
        )));
    }
    let output = config.kernel_dir.join(relative);

    if file_exists_and_not_empty(&output) && !overwrite {
        debug!("Using existing {}", output.display());
        return Ok(output);
    }

    download_file(config, &generic_kernel_url(config, relative), &output)?;
    Ok(output)
}
