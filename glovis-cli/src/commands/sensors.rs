//! `glovis sensors`: print the supported sensors.

use glovis::sensor::{CellNaming, SensorKind};

use crate::error::CliError;

pub fn run() -> Result<(), CliError> {
    println!(
        "{:<34} {:<12} {:>8} {:<12} {:<18}",
        "Sensor", "Dataset", "Offset", "Resolutions", "Grid"
    );
    for sensor in SensorKind::ALL {
        let caps = sensor.capabilities();
        let resolutions = caps
            .resolutions
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let axes = match caps.cell_naming {
            CellNaming::PathRow => ("p", "r"),
            CellNaming::ModisTile => ("h", "v"),
        };
        let grid = format!(
            "{}{}-{} {}{}-{}",
            axes.0,
            caps.grid.min_col,
            caps.grid.max_col,
            axes.1,
            caps.grid.min_row,
            caps.grid.max_row
        );
        println!(
            "{:<34} {:<12} {:>7}m {:<12} {:<18}",
            caps.name, caps.dataset, caps.offset_resolution, resolutions, grid
        );
    }
    Ok(())
}
