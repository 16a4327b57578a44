//! OCR stage of the extraction chain: image preprocessing and the text-line
//! parsing heuristics applied to whatever the OCR backend returns.

use image::GrayImage;

/// Text-line recognition backend.
///
/// Implementations (Tesseract bindings, an ONNX TrOCR model, a remote OCR
/// service) are host-provided; the core only needs multi-line text back.
pub trait OcrEngine: Send + Sync {
    /// Recognize text lines in a binarized image.
    fn recognize(&self, binarized: &GrayImage) -> anyhow::Result<String>;
}

/// Tunables for the OCR stage.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Half-width of the local window used by adaptive thresholding.
    pub window_radius: u32,
    /// Offset subtracted from the local mean; larger values suppress noise.
    pub threshold_offset: i16,
    /// Ranked column-delimiter candidates tested against the header line.
    pub delimiters: Vec<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            window_radius: 15,
            threshold_offset: 10,
            delimiters: vec![
                "\t".to_string(),
                "  ".to_string(),
                " | ".to_string(),
                ",".to_string(),
                ";".to_string(),
            ],
        }
    }
}

/// Binarize a grayscale image with a mean-of-window adaptive threshold.
///
/// Pixels darker than the local mean (minus the configured offset) become
/// foreground (255), the rest background (0). The local mean handles uneven
/// lighting that a single global threshold cannot.
pub fn binarize(gray: &GrayImage, config: &OcrConfig) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }

    // Integral image with a zero row/column of padding.
    let iw = (w + 1) as usize;
    let ih = (h + 1) as usize;
    let mut integral = vec![0u64; iw * ih];
    for y in 0..h as usize {
        let mut row_sum = 0u64;
        for x in 0..w as usize {
            row_sum += u64::from(gray.get_pixel(x as u32, y as u32)[0]);
            integral[(y + 1) * iw + (x + 1)] = integral[y * iw + (x + 1)] + row_sum;
        }
    }

    let r = config.window_radius as i64;
    let mut out = GrayImage::new(w, h);
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let x0 = (x - r).max(0) as usize;
            let y0 = (y - r).max(0) as usize;
            let x1 = ((x + r + 1).min(w as i64)) as usize;
            let y1 = ((y + r + 1).min(h as i64)) as usize;
            let area = ((x1 - x0) * (y1 - y0)) as i64;
            let sum = integral[y1 * iw + x1] + integral[y0 * iw + x0]
                - integral[y0 * iw + x1]
                - integral[y1 * iw + x0];
            let mean = sum as i64 / area;
            let p = i64::from(gray.get_pixel(x as u32, y as u32)[0]);
            let v = if p < mean - i64::from(config.threshold_offset) {
                255
            } else {
                0
            };
            out.put_pixel(x as u32, y as u32, image::Luma([v]));
        }
    }
    out
}

/// Pick the delimiter candidate that splits `header` into the most fields.
///
/// Candidates are tried in rank order; a later candidate wins only with a
/// strictly higher field count. Returns `None` when no candidate yields at
/// least two fields (callers fall back to whitespace tokenization).
pub fn detect_delimiter<'a>(header: &str, candidates: &'a [String]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for cand in candidates {
        let fields = split_on(header, cand).len();
        if fields >= 2 && best.map_or(true, |(_, n)| fields > n) {
            best = Some((cand.as_str(), fields));
        }
    }
    best.map(|(d, _)| d)
}

/// Split a line on an explicit delimiter, or on whitespace when `delimiter`
/// is `None`. Fields are trimmed; empty fields are preserved for explicit
/// delimiters (they mark missing cells) but not for whitespace splits.
pub fn split_fields(line: &str, delimiter: Option<&str>) -> Vec<String> {
    match delimiter {
        Some(d) => split_on(line, d),
        None => line.split_whitespace().map(str::to_string).collect(),
    }
}

fn split_on(line: &str, delimiter: &str) -> Vec<String> {
    line.split(delimiter).map(|f| f.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_highest_yield_delimiter() {
        let cfg = OcrConfig::default();
        assert_eq!(detect_delimiter("a\tb\tc", &cfg.delimiters), Some("\t"));
        assert_eq!(detect_delimiter("a | b | c", &cfg.delimiters), Some(" | "));
        assert_eq!(detect_delimiter("a,b,c,d", &cfg.delimiters), Some(","));
        assert_eq!(detect_delimiter("one-token", &cfg.delimiters), None);
    }

    #[test]
    fn earlier_candidate_wins_ties() {
        let cfg = OcrConfig::default();
        // Tab and comma both yield 3 fields; tab is ranked first.
        assert_eq!(detect_delimiter("a\tb,c\td,e", &cfg.delimiters), Some("\t"));
    }

    #[test]
    fn whitespace_split_drops_empty_fields() {
        assert_eq!(split_fields("a   b  c", None), vec!["a", "b", "c"]);
        assert_eq!(split_fields("a,,c", Some(",")), vec!["a", "", "c"]);
    }

    #[test]
    fn binarize_marks_dark_pixels_as_foreground() {
        let mut img = GrayImage::from_pixel(32, 32, image::Luma([200]));
        img.put_pixel(16, 16, image::Luma([20]));
        let bin = binarize(&img, &OcrConfig::default());
        assert_eq!(bin.get_pixel(16, 16)[0], 255);
        assert_eq!(bin.get_pixel(0, 0)[0], 0);
    }
}
