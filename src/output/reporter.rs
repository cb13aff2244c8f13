use super::*;
use anyhow::{Context, Result};
use std::fs;
use tracing::info;

pub struct Reporter {
    format: OutputFormat,
    output_path: Option<String>,
}

impl Reporter {
    pub fn new(format: &str, output_path: Option<&str>) -> Self {
        let format = OutputFormat::from(format);
        let output_path = output_path.map(|path| super::add_file_extension(path, &format));

        Self {
            format,
            output_path,
        }
    }

    pub fn render(&self, report: &ActivityReport, config: &Config) -> Result<String> {
        let content = match self.format {
            OutputFormat::Table => table::render(report, config),
            OutputFormat::Json => to_json(report).context("Failed to serialise report")?,
        };
        Ok(content)
    }

    /// Writes to the output file when one was given, stdout otherwise.
    pub fn generate_report(&self, report: &ActivityReport, config: &Config) -> Result<()> {
        let content = self.render(report, config)?;

        match &self.output_path {
            Some(path) => {
                fs::write(path, content).with_context(|| format!("Failed to write {}", path))?;
                info!("Report saved to {}", path);
            }
            None => println!("{}", content),
        }
        Ok(())
    }
}
