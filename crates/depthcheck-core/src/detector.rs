use crate::geometry::FaceRegion;

/// Pluggable face detection backend.
///
/// Implementations hold (or have access to) the captured photo and return
/// every face they find, normalized in detector convention (bottom-left
/// origin). Asynchronous detectors are bridged by the implementor; the
/// analysis only ever makes this one direct call.
pub trait FaceDetector {
    fn detect(&self) -> Vec<FaceRegion>;
}

/// Detector that replays a precomputed list of faces, e.g. from a capture
/// manifest or a platform detector that already ran.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    faces: Vec<FaceRegion>,
}

impl StaticDetector {
    pub fn new(faces: Vec<FaceRegion>) -> Self {
        Self { faces }
    }
}

impl FaceDetector for StaticDetector {
    fn detect(&self) -> Vec<FaceRegion> {
        self.faces.clone()
    }
}
