//! PNG atlas of neuron prototypes.
//!
//! The atlas lays the depth slices of the lattice out left to right, with a
//! gap between slices. Inside a slice every neuron gets a square tile showing
//! its prototype sample, tinted by the neuron's class color. Neurons without
//! a prototype are filled with their color at quarter brightness.

use crate::error::Result;
use crate::som::{LatticeView, Neuron};
use image::{ImageBuffer, Rgb, RgbImage};
use log::info;
use std::path::Path;

/// Pixels between two depth slices.
pub const SLICE_GAP: u32 = 4;

/// Side length of a prototype tile for vectors of `input_size` elements.
///
/// Prototypes are assumed to be square images; extra trailing elements are
/// ignored.
pub fn tile_side(input_size: usize) -> u32 {
    ((input_size as f64).sqrt().floor() as u32).max(1)
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn tile_pixel(neuron: &Neuron, px: u32, py: u32, side: u32) -> Rgb<u8> {
    let [r, g, b] = neuron.color;
    match &neuron.prototype {
        Some(prototype) => {
            let v = prototype
                .get((py * side + px) as usize)
                .copied()
                .unwrap_or(0.0);
            Rgb([to_byte(r * v), to_byte(g * v), to_byte(b * v)])
        }
        None => Rgb([to_byte(r * 0.25), to_byte(g * 0.25), to_byte(b * 0.25)]),
    }
}

/// Renders the atlas at `scale` screen pixels per prototype pixel.
pub fn prototype_atlas(view: &LatticeView<'_>, scale: u32) -> RgbImage {
    let scale = scale.max(1);
    let side = tile_side(view.input_size);
    let tile = side * scale;

    let slice_w = view.width as u32 * tile;
    let slice_h = view.height as u32 * tile;
    let depth = view.depth as u32;
    let width = depth * slice_w + depth.saturating_sub(1) * SLICE_GAP;

    ImageBuffer::from_fn(width, slice_h, |x, y| {
        let z = x / (slice_w + SLICE_GAP);
        let sx = x % (slice_w + SLICE_GAP);
        if sx >= slice_w {
            return Rgb([0u8, 0u8, 0u8]);
        }

        let nx = (sx / tile) as usize;
        let ny = (y / tile) as usize;
        let px = (sx % tile) / scale;
        let py = (y % tile) / scale;

        match view.neuron_at(nx, ny, z as usize) {
            Some(neuron) => tile_pixel(neuron, px, py, side),
            None => Rgb([0u8, 0u8, 0u8]),
        }
    })
}

/// Renders the atlas and writes it as PNG.
pub fn save_atlas<P: AsRef<Path>>(view: &LatticeView<'_>, scale: u32, path: P) -> Result<()> {
    let atlas = prototype_atlas(view, scale);
    atlas.save(path.as_ref())?;
    info!(
        "Saved {}x{} prototype atlas to {}",
        atlas.width(),
        atlas.height(),
        path.as_ref().display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::som::{KohonenNetwork, Lattice};

    #[test]
    fn test_tile_side() {
        assert_eq!(tile_side(784), 28);
        assert_eq!(tile_side(10), 3);
        assert_eq!(tile_side(1), 1);
    }

    #[test]
    fn test_atlas_dimensions() {
        let network = KohonenNetwork::new(3, 2, 4, 16).unwrap();
        let atlas = prototype_atlas(&network.view(), 2);
        // 4 slices of 3 tiles of 4 pixels at scale 2, plus 3 gaps.
        assert_eq!(atlas.width(), 4 * 3 * 8 + 3 * SLICE_GAP);
        assert_eq!(atlas.height(), 2 * 8);
    }

    #[test]
    fn test_atlas_pixels() {
        let lattice = Lattice::with_weights(2, 1, 1, vec![vec![0.0; 4], vec![1.0; 4]]).unwrap();
        let mut network = KohonenNetwork::from_lattice(lattice, Some(0));
        let dataset = vec![crate::dataset::Sample::new(
            0,
            vec![1.0, 0.0, 0.0, 0.0],
            crate::dataset::DatasetType::Mnist,
        )];
        network.classify_neurons(&dataset);
        network.find_prototypes(&dataset);
        network.update_colors();

        let atlas = prototype_atlas(&network.view(), 1);
        // Neuron 0 is class 0 (red) with a single lit pixel.
        assert_eq!(atlas.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(atlas.get_pixel(1, 0), &Rgb([0, 0, 0]));
        // Neuron 1 never won a sample: quarter-brightness gray.
        assert_eq!(atlas.get_pixel(2, 0), &Rgb([32, 32, 32]));
    }
}
