use anyhow::{Context, Result, ensure};
use frontend::{MatrixDataset, build_chromosomes};
use serde::Deserialize;
use std::path::Path;

/// Chromosome layout and resolution ladder of a contact matrix, as written
/// next to the matrix file.
#[derive(Debug, Deserialize)]
pub struct DatasetDescription {
    #[serde(default)]
    pub genome_id: Option<String>,
    #[serde(default = "default_whole_genome")]
    pub whole_genome: bool,
    pub resolutions: Vec<u64>,
    #[serde(default)]
    pub chromosomes: Vec<ChromosomeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ChromosomeEntry {
    pub name: String,
    pub length: u64,
}

fn default_whole_genome() -> bool {
    true
}

impl DatasetDescription {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let description: DatasetDescription =
            toml::from_str(content).context("Failed to parse dataset description")?;
        description.validate()?;
        Ok(description)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.chromosomes.is_empty(), "dataset lists no chromosomes");
        ensure!(!self.resolutions.is_empty(), "dataset lists no resolutions");
        ensure!(
            self.resolutions.windows(2).all(|pair| pair[0] > pair[1]),
            "resolutions must be listed coarsest first: {:?}",
            self.resolutions
        );
        if let Some(entry) = self.chromosomes.iter().find(|entry| entry.length == 0) {
            anyhow::bail!("chromosome {} has zero length", entry.name);
        }
        Ok(())
    }

    pub fn into_dataset(self) -> MatrixDataset {
        let chromosomes = build_chromosomes(
            self.chromosomes
                .iter()
                .map(|entry| (entry.name.as_str(), entry.length)),
            self.whole_genome,
        );
        MatrixDataset::new(self.genome_id, chromosomes, self.resolutions)
    }
}

pub fn load_dataset_description(path: &Path) -> Result<DatasetDescription> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset description: {}", path.display()))?;
    DatasetDescription::from_toml_str(&content)
        .with_context(|| format!("Invalid dataset description: {}", path.display()))
}
