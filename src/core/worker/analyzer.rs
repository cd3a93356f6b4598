//! Per-photo analyzers run by the scan worker.

use crate::core::cache::{AnalysisRecord, BlurAnalysis, MethodScore, BLUR};
use crate::core::hasher::fast_decode::FastDecoder;
use crate::core::media::MediaItem;
use crate::core::sharpness::{SharpnessMethod, SharpnessScorer};
use crate::error::AnalysisError;
use tracing::{debug, warn};

/// Analyzes one photo and writes its output into the photo's record
pub trait PhotoAnalyzer: Send + Sync {
    /// Name under which the output is stored
    fn name(&self) -> &str;

    fn analyze(&self, item: &MediaItem, record: &mut AnalysisRecord) -> Result<(), AnalysisError>;
}

/// Scores sharpness with every configured method.
///
/// The photo is decoded once. A decode failure fails the photo; a method
/// producing an unusable score is recorded as that method's error.
pub struct SharpnessAnalyzer {
    scorer: SharpnessScorer,
    methods: Vec<SharpnessMethod>,
}

impl SharpnessAnalyzer {
    pub fn new(methods: Vec<SharpnessMethod>) -> Self {
        Self::with_scorer(SharpnessScorer::new(), methods)
    }

    pub fn with_scorer(scorer: SharpnessScorer, methods: Vec<SharpnessMethod>) -> Self {
        Self { scorer, methods }
    }

    pub fn methods(&self) -> &[SharpnessMethod] {
        &self.methods
    }
}

impl PhotoAnalyzer for SharpnessAnalyzer {
    fn name(&self) -> &str {
        BLUR
    }

    fn analyze(&self, item: &MediaItem, record: &mut AnalysisRecord) -> Result<(), AnalysisError> {
        let image = FastDecoder::decode(&item.path)?;
        let gray = self.scorer.prepare(&image);

        let mut blur = BlurAnalysis::default();
        for method in &self.methods {
            let score = self.scorer.score_gray(&gray, *method);
            let entry = if score.is_finite() {
                debug!(path = %item.path.display(), method = %method, score, "Sharpness");
                MethodScore::ok(score)
            } else {
                warn!(path = %item.path.display(), method = %method, "Unusable sharpness score {}", score);
                MethodScore::failed(format!("{} produced a non-finite score", method))
            };
            blur.methods.insert(method.name().to_string(), entry);
        }

        record.set_blur(blur);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scores_every_configured_method() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("grid.png");
        GrayImage::from_fn(64, 64, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Luma([250])
            } else {
                Luma([10])
            }
        })
        .save(&path)
        .unwrap();

        let analyzer = SharpnessAnalyzer::new(vec![SharpnessMethod::Laplacian, SharpnessMethod::Variance]);
        let mut record = AnalysisRecord::new(&path);
        analyzer.analyze(&MediaItem::new(&path), &mut record).unwrap();

        let blur = record.analyses.blur.as_ref().unwrap();
        assert_eq!(blur.methods.len(), 2);
        assert!(blur.score(SharpnessMethod::Laplacian).unwrap().value > 0.0);
        assert!(blur.score(SharpnessMethod::Variance).unwrap().value > 0.0);
        assert!(blur.score(SharpnessMethod::Tenengrad).is_none());
        assert_eq!(blur.methods["laplacian"].method_version.as_deref(), Some("1.0"));
    }

    #[test]
    fn undecodable_photo_fails_the_item() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").unwrap();

        let analyzer = SharpnessAnalyzer::new(vec![SharpnessMethod::Laplacian]);
        let mut record = AnalysisRecord::new(&path);
        let result = analyzer.analyze(&MediaItem::new(&path), &mut record);

        assert!(matches!(result, Err(AnalysisError::Hash(ref e)) if e.is_decode()));
        assert!(record.analyses.blur.is_none());
    }
}
