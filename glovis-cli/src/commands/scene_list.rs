//! Scene-list file CLI commands.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use glovis::scene_list::SceneListFile;
use tracing::info;

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum SceneListCommands {
    /// Validate a scene-list file and summarise its contents
    Check {
        /// Scene-list file to read
        file: PathBuf,
    },

    /// Rewrite a scene-list file with merged blocks and no duplicates
    Normalize {
        /// Scene-list file to read
        input: PathBuf,

        /// Where to write the normalised list
        output: PathBuf,
    },
}

pub fn run(command: SceneListCommands) -> Result<(), CliError> {
    match command {
        SceneListCommands::Check { file } => run_check(&file),
        SceneListCommands::Normalize { input, output } => run_normalize(&input, &output),
    }
}

fn run_check(path: &Path) -> Result<(), CliError> {
    let list = SceneListFile::load(path)?;

    println!("{}: {} scenes", path.display(), list.scene_count());
    for block in &list.blocks {
        println!("  {:<34} {:>6}", block.sensor.to_string(), block.entity_ids.len());
    }
    Ok(())
}

fn run_normalize(input: &Path, output: &Path) -> Result<(), CliError> {
    let list = SceneListFile::load(input)?;
    list.save(output)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        scenes = list.scene_count(),
        "Scene list normalised"
    );
    println!(
        "Wrote {} scenes in {} blocks to {}",
        list.scene_count(),
        list.blocks.len(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_merges_blocks() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(
            &input,
            "GloVis Scene List\nsensor=Landsat 7 ETM+\nA1\n\ndataset=MOD09GA\nM1\nsensor=LANDSAT_ETM\nA2\nA1\n",
        )
        .unwrap();

        run_normalize(&input, &output).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        assert_eq!(
            written,
            "GloVis Scene List\nsensor=MODIS Terra Surface Reflectance\nM1\nsensor=Landsat 7 ETM+\nA1\nA2\n"
        );
    }

    #[test]
    fn test_check_rejects_missing_header() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.txt");
        fs::write(&input, "sensor=Landsat 7 ETM+\nA1\n").unwrap();

        let err = run_check(&input).unwrap_err();
        assert!(matches!(err, CliError::SceneList(_)));
    }
}
