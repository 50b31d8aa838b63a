//! Nearest-aspect-ratio matching against the fixed resolution buckets the
//! latent models were trained on.

use serde::Serialize;
use tracing::debug;

use crate::error::NodeError;
use crate::tensor::{ImageTensor, Latent, LATENT_DOWNSCALE};

/// One training resolution bucket. `ratio` is `height / width`, rounded the
/// way the bucket list was published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AspectRatioEntry {
    pub height: u32,
    pub width: u32,
    pub ratio: f64,
}

const fn entry(height: u32, width: u32, ratio: f64) -> AspectRatioEntry {
    AspectRatioEntry {
        height,
        width,
        ratio,
    }
}

/// Ordered from widest (0.25) to tallest (4.0). Scan order matters for ties.
pub const ASPECT_RATIOS: [AspectRatioEntry; 40] = [
    entry(512, 2048, 0.25),
    entry(512, 1984, 0.26),
    entry(512, 1920, 0.27),
    entry(512, 1856, 0.28),
    entry(576, 1792, 0.32),
    entry(576, 1728, 0.33),
    entry(576, 1664, 0.35),
    entry(640, 1600, 0.4),
    entry(640, 1536, 0.42),
    entry(704, 1472, 0.48),
    entry(704, 1408, 0.5),
    entry(704, 1344, 0.52),
    entry(768, 1344, 0.57),
    entry(768, 1280, 0.6),
    entry(832, 1216, 0.68),
    entry(832, 1152, 0.72),
    entry(896, 1152, 0.78),
    entry(896, 1088, 0.82),
    entry(960, 1088, 0.88),
    entry(960, 1024, 0.94),
    entry(1024, 1024, 1.0),
    entry(1024, 960, 1.07),
    entry(1088, 960, 1.13),
    entry(1088, 896, 1.21),
    entry(1152, 896, 1.29),
    entry(1152, 832, 1.38),
    entry(1216, 832, 1.46),
    entry(1280, 768, 1.67),
    entry(1344, 768, 1.75),
    entry(1408, 704, 2.0),
    entry(1472, 704, 2.09),
    entry(1536, 640, 2.4),
    entry(1600, 640, 2.5),
    entry(1664, 576, 2.89),
    entry(1728, 576, 3.0),
    entry(1792, 576, 3.11),
    entry(1856, 512, 3.62),
    entry(1920, 512, 3.75),
    entry(1984, 512, 3.88),
    entry(2048, 512, 4.0),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AspectRatioMatch {
    pub input_width: u32,
    pub input_height: u32,
    pub input_ratio: f64,
    pub matched: AspectRatioEntry,
    pub latent_height: u32,
    pub latent_width: u32,
    #[serde(skip)]
    pub latent: Latent,
    pub info: String,
}

/// Picks the pixel dimensions to match against. An image always wins over
/// explicit `width`/`height`; without one, both must be given and positive.
/// Returns `(width, height)`.
pub fn resolve_input_dimensions(
    image: Option<&ImageTensor>,
    width: Option<i32>,
    height: Option<i32>,
) -> Result<(u32, u32), NodeError> {
    if let Some(image) = image {
        let width = positive_dimension("image width", image.width() as i64)?;
        let height = positive_dimension("image height", image.height() as i64)?;
        debug!(width, height, "using image dimensions");
        return Ok((width, height));
    }

    let (Some(width), Some(height)) = (width, height) else {
        return Err(NodeError::invalid_input(
            "Either an image or both width and height must be provided",
        ));
    };
    let width = positive_dimension("width", width as i64)?;
    let height = positive_dimension("height", height as i64)?;
    debug!(width, height, "using explicit dimensions");
    Ok((width, height))
}

fn positive_dimension(name: &str, value: i64) -> Result<u32, NodeError> {
    if value <= 0 {
        return Err(NodeError::invalid_input(format!(
            "{name} must be positive, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| NodeError::invalid_input(format!("{name} is too large: {value}")))
}

/// Linear scan keeping the first entry with the strictly smallest distance,
/// so an equidistant later entry never replaces an earlier one.
pub fn closest_entry(table: &[AspectRatioEntry], target_ratio: f64) -> Option<AspectRatioEntry> {
    let mut min_diff = f64::INFINITY;
    let mut closest = None;
    for candidate in table {
        let diff = (candidate.ratio - target_ratio).abs();
        if diff < min_diff {
            min_diff = diff;
            closest = Some(*candidate);
        }
    }
    closest
}

pub fn find_closest_aspect_ratio(target_ratio: f64) -> AspectRatioEntry {
    // The table is a non-empty constant; a NaN target compares false
    // everywhere, so fall back to the first bucket like an untouched scan.
    closest_entry(&ASPECT_RATIOS, target_ratio).unwrap_or(ASPECT_RATIOS[0])
}

pub fn build_result(
    batch_size: usize,
    input_width: u32,
    input_height: u32,
    matched: AspectRatioEntry,
) -> Result<AspectRatioMatch, NodeError> {
    if input_width == 0 {
        return Err(NodeError::invalid_input("input width must be positive"));
    }
    let input_ratio = input_height as f64 / input_width as f64;
    let latent_height = matched.height / LATENT_DOWNSCALE;
    let latent_width = matched.width / LATENT_DOWNSCALE;
    let latent = Latent::empty(batch_size, matched.height, matched.width);
    let info = format!(
        "Input: {input_width}x{input_height} (AR: {input_ratio:.2}) → Matched: {}x{} (AR: {:.2})",
        matched.width, matched.height, matched.ratio
    );

    Ok(AspectRatioMatch {
        input_width,
        input_height,
        input_ratio,
        matched,
        latent_height,
        latent_width,
        latent,
        info,
    })
}

/// Resolve, match and allocate in one call.
pub fn match_aspect_ratio(
    batch_size: usize,
    image: Option<&ImageTensor>,
    width: Option<i32>,
    height: Option<i32>,
) -> Result<AspectRatioMatch, NodeError> {
    let (input_width, input_height) = resolve_input_dimensions(image, width, height)?;
    let target_ratio = input_height as f64 / input_width as f64;
    let matched = find_closest_aspect_ratio(target_ratio);
    debug!(
        target_ratio,
        matched_height = matched.height,
        matched_width = matched.width,
        matched_ratio = matched.ratio,
        "matched aspect ratio bucket"
    );
    build_result(batch_size, input_width, input_height, matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_ordered_and_lockstep() {
        for pair in ASPECT_RATIOS.windows(2) {
            assert!(pair[0].ratio < pair[1].ratio);
            assert!(pair[0].height <= pair[1].height);
            assert!(pair[0].width >= pair[1].width);
        }
        assert_eq!(ASPECT_RATIOS[0].ratio, 0.25);
        assert_eq!(ASPECT_RATIOS[39].ratio, 4.0);
    }

    #[test]
    fn every_bucket_is_divisible_by_eight() {
        for entry in ASPECT_RATIOS {
            assert_eq!(entry.height % 8, 0, "{entry:?}");
            assert_eq!(entry.width % 8, 0, "{entry:?}");
        }
    }

    #[test]
    fn every_bucket_matches_itself() {
        for entry in ASPECT_RATIOS {
            assert_eq!(find_closest_aspect_ratio(entry.ratio), entry);
        }
    }

    #[test]
    fn equidistant_buckets_keep_the_earlier_one() {
        let table = [entry(8, 16, 0.5), entry(16, 8, 2.0)];
        assert_eq!(closest_entry(&table, 1.25), Some(table[0]));
        let reversed = [table[1], table[0]];
        assert_eq!(closest_entry(&reversed, 1.25), Some(table[1]));
    }

    #[test]
    fn empty_table_has_no_match() {
        assert_eq!(closest_entry(&[], 1.0), None);
    }

    #[test]
    fn out_of_range_ratios_clamp_to_the_ends() {
        assert_eq!(find_closest_aspect_ratio(0.01), ASPECT_RATIOS[0]);
        assert_eq!(find_closest_aspect_ratio(100.0), ASPECT_RATIOS[39]);
    }

    #[test]
    fn square_image_matches_square_bucket() {
        let image = ImageTensor::new(1, 512, 512, 3);
        let result = match_aspect_ratio(1, Some(&image), None, None).unwrap();
        assert_eq!(result.input_ratio, 1.0);
        assert_eq!(result.matched, entry(1024, 1024, 1.0));
        assert_eq!((result.latent_height, result.latent_width), (128, 128));
        assert_eq!(result.latent.samples.shape(), &[1, 4, 128, 128]);
    }

    #[test]
    fn only_the_ratio_matters() {
        let small = ImageTensor::new(1, 512, 512, 3);
        let large = ImageTensor::new(1, 900, 900, 3);
        let a = match_aspect_ratio(1, Some(&small), None, None).unwrap();
        let b = match_aspect_ratio(1, Some(&large), None, None).unwrap();
        assert_eq!(a.matched, b.matched);
        assert_eq!(a.latent, b.latent);
    }

    #[test]
    fn wide_explicit_dimensions() {
        let result = match_aspect_ratio(2, None, Some(1920), Some(512)).unwrap();
        assert!((result.input_ratio - 0.2667).abs() < 0.0001);
        assert_eq!(result.matched, entry(512, 1920, 0.27));
        assert_eq!((result.latent_height, result.latent_width), (64, 240));
        assert_eq!(result.latent.samples.shape(), &[2, 4, 64, 240]);
        assert_eq!(
            result.info,
            "Input: 1920x512 (AR: 0.27) → Matched: 1920x512 (AR: 0.27)"
        );
    }

    #[test]
    fn tallest_explicit_dimensions() {
        let result = match_aspect_ratio(1, None, Some(512), Some(2048)).unwrap();
        assert_eq!(result.input_ratio, 4.0);
        assert_eq!(result.matched, entry(2048, 512, 4.0));
        assert_eq!((result.latent_height, result.latent_width), (256, 64));
    }

    #[test]
    fn landscape_hd_rounds_to_nearest_bucket() {
        let result = match_aspect_ratio(1, None, Some(1920), Some(1088)).unwrap();
        assert_eq!(result.matched, entry(768, 1344, 0.57));
        assert_eq!(
            result.info,
            "Input: 1920x1088 (AR: 0.57) → Matched: 1344x768 (AR: 0.57)"
        );
    }

    #[test]
    fn image_takes_precedence_over_explicit_dimensions() {
        let image = ImageTensor::new(1, 2048, 512, 3);
        let (width, height) =
            resolve_input_dimensions(Some(&image), Some(1920), Some(512)).unwrap();
        assert_eq!((width, height), (512, 2048));
    }

    #[test]
    fn missing_height_is_invalid() {
        let result = resolve_input_dimensions(None, Some(100), None);
        assert!(matches!(result, Err(NodeError::InvalidInput(_))));
        let result = match_aspect_ratio(1, None, None, Some(100));
        assert!(matches!(result, Err(NodeError::InvalidInput(_))));
    }

    #[test]
    fn non_positive_dimensions_are_invalid() {
        assert!(matches!(
            resolve_input_dimensions(None, Some(0), Some(512)),
            Err(NodeError::InvalidInput(_))
        ));
        assert!(matches!(
            resolve_input_dimensions(None, Some(512), Some(-8)),
            Err(NodeError::InvalidInput(_))
        ));
        let empty = ImageTensor::new(1, 0, 512, 3);
        assert!(matches!(
            resolve_input_dimensions(Some(&empty), None, None),
            Err(NodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn build_result_rejects_zero_width() {
        let result = build_result(1, 0, 512, ASPECT_RATIOS[20]);
        assert!(matches!(result, Err(NodeError::InvalidInput(_))));
    }

    #[test]
    fn matching_is_deterministic_across_threads() {
        let expected = find_closest_aspect_ratio(1.5);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| find_closest_aspect_ratio(1.5)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
        assert_eq!(expected, entry(1216, 832, 1.46));
    }
}
