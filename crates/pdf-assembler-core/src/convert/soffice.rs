use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{OfficeConverter, OfficeFormat, TargetFormat};
use crate::config::ConverterConfig;
use crate::error::{Error, Result};

/// Base name of the staged input file inside the scratch directory
const SOURCE_STEM: &str = "source";

/// Converter that shells out to a headless LibreOffice (`soffice`)
#[derive(Debug, Clone)]
pub struct SofficeConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl SofficeConverter {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            config.binary.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, workdir: &Path, input: &Path, target: TargetFormat) -> Command {
        // A private profile lets concurrent conversions run without fighting
        // over the user's LibreOffice lock file.
        let profile = format!("-env:UserInstallation=file://{}", workdir.join("profile").display());

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless")
            .arg(profile)
            .arg("--convert-to")
            .arg(target.extension())
            .arg("--outdir")
            .arg(workdir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl OfficeConverter for SofficeConverter {
    fn name(&self) -> &'static str {
        "soffice"
    }

    async fn convert(
        &self,
        input: &[u8],
        format: OfficeFormat,
        target: TargetFormat,
    ) -> Result<Vec<u8>> {
        let workdir = tempfile::Builder::new()
            .prefix("pdf-assembler-")
            .tempdir()?;
        let source = workdir
            .path()
            .join(format!("{SOURCE_STEM}.{}", format.extension()));
        tokio::fs::write(&source, input).await?;

        info!(
            "Converting {} bytes of .{} with {}",
            input.len(),
            format.extension(),
            self.binary.display()
        );

        let child = self
            .command(workdir.path(), &source, target)
            .spawn()
            .map_err(|e| Error::ConverterUnavailable(format!("{}: {e}", self.binary.display())))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!("Converter timed out after {:?}", self.timeout);
                Error::ConversionTimeout(self.timeout.as_secs())
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ConversionFailed(format!(
                "converter exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        debug!("Converter stdout: {}", String::from_utf8_lossy(&output.stdout).trim());

        let produced = workdir
            .path()
            .join(format!("{SOURCE_STEM}.{}", target.extension()));
        let bytes = match tokio::fs::read(&produced).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConversionFailed(
                    "converter produced no output file".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.is_empty() {
            return Err(Error::ConversionFailed(
                "converter produced an empty file".to_string(),
            ));
        }

        info!("Conversion produced {} bytes", bytes.len());
        Ok(bytes)
    }
}
