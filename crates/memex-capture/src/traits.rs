//! Narrow seams for the three externally-supplied capabilities (SPEC_FULL
//! §4.3/§1's Non-goals): the screenshot library, the OCR engine, and the
//! embedding model. Each ships a fake (deterministic, in-memory) and a null
//! (no-op) implementation so the capture loop is testable and runnable on a
//! headless box without a real backend wired in.
use crate::error::CaptureError;

pub trait ScreenCapture: Send + Sync {
    /// Enumerate the displays available this tick.
    fn displays(&self) -> Result<Vec<String>, CaptureError>;
    /// Capture a single display, returning opaque image bytes.
    fn capture(&self, display: &str) -> Result<Vec<u8>, CaptureError>;
}

pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, image: &[u8]) -> Result<String, CaptureError>;
}

pub trait Embedder: Send + Sync {
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>, CaptureError>;
}

/// In-memory fake: one fixed display producing a caller-supplied OCR text.
pub struct FakeScreenCapture {
    displays: Vec<String>,
}

impl FakeScreenCapture {
    pub fn new(displays: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            displays: displays.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(display: impl Into<String>) -> Self {
        Self::new([display.into()])
    }
}

impl ScreenCapture for FakeScreenCapture {
    fn displays(&self) -> Result<Vec<String>, CaptureError> {
        Ok(self.displays.clone())
    }

    fn capture(&self, display: &str) -> Result<Vec<u8>, CaptureError> {
        Ok(display.as_bytes().to_vec())
    }
}

/// No-op screenshot source: no displays, used on headless hosts.
#[derive(Default)]
pub struct NullScreenCapture;

impl ScreenCapture for NullScreenCapture {
    fn displays(&self) -> Result<Vec<String>, CaptureError> {
        Ok(Vec::new())
    }

    fn capture(&self, display: &str) -> Result<Vec<u8>, CaptureError> {
        Err(CaptureError::DisplayUnavailable(display.to_string()))
    }
}

/// Fake OCR: decodes the image bytes as UTF-8, falling back to empty text.
/// Pairs with [`FakeScreenCapture`] so tests can control exact OCR output by
/// controlling the fake screenshot bytes.
#[derive(Default)]
pub struct FakeTextExtractor;

impl TextExtractor for FakeTextExtractor {
    fn extract_text(&self, image: &[u8]) -> Result<String, CaptureError> {
        Ok(String::from_utf8_lossy(image).into_owned())
    }
}

/// Null OCR: always produces empty text.
#[derive(Default)]
pub struct NullTextExtractor;

impl TextExtractor for NullTextExtractor {
    fn extract_text(&self, _image: &[u8]) -> Result<String, CaptureError> {
        Ok(String::new())
    }
}

/// Deterministic fake embedder: hashes the text into a fixed-dimension
/// vector. Good enough to exercise upsert/query plumbing without a real
/// embedding model.
pub struct FakeEmbedder {
    dimension: usize,
}

impl FakeEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for FakeEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, CaptureError> {
        let mut vector = vec![0.0_f32; self.dimension];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dimension] += byte as f32;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

/// Null embedder: always the zero vector. Upserts using it still succeed;
/// similarity search over an all-zero embedding degenerates but does not
/// error, matching (B)'s "empty index is a valid state" contract.
pub struct NullEmbedder {
    dimension: usize,
}

impl NullEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Embedder for NullEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, CaptureError> {
        Ok(vec![0.0; self.dimension])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_screen_capture_round_trips_through_fake_ocr() {
        let screens = FakeScreenCapture::single("Display_1");
        let ocr = FakeTextExtractor;
        let image = screens.capture("Display_1").unwrap();
        assert_eq!(ocr.extract_text(&image).unwrap(), "Display_1");
    }

    #[test]
    fn null_screen_capture_has_no_displays() {
        let screens = NullScreenCapture;
        assert!(screens.displays().unwrap().is_empty());
        assert!(screens.capture("Display_1").is_err());
    }

    #[test]
    fn fake_embedder_produces_fixed_dimension_unit_vector() {
        let embedder = FakeEmbedder::new(8);
        let v = embedder.embed("hello world").unwrap();
        assert_eq!(v.len(), 8);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01 || norm == 0.0);
    }

    #[test]
    fn null_embedder_is_zero_vector() {
        let embedder = NullEmbedder::new(4);
        assert_eq!(embedder.embed("anything").unwrap(), vec![0.0; 4]);
    }
}
