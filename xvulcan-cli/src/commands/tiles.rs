//! Tile range command.
//!
//! Prints the slippy-map tiles covering an area without fetching anything.

use xvulcan::coord::tile_range;

use super::common::AreaArgs;
use crate::error::CliError;

/// Print the tile range covering `area` at `zoom`.
pub fn run(area: AreaArgs, zoom: u8, list: bool) -> Result<(), CliError> {
    let bbox = area.bounding_box()?;
    let range = tile_range(&bbox, zoom)?;

    println!("Area:  {}", bbox);
    println!("Zoom:  {}", range.zoom);
    println!("X:     {}..={}", range.x_min, range.x_max);
    println!("Y:     {}..={}", range.y_min, range.y_max);
    println!("Tiles: {}", range.count());

    if list {
        for tile in range.tiles() {
            println!("{}", tile);
        }
    }

    Ok(())
}
