use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use depthcheck_core::{
    AnalysisOptions, AntiSpoofingVerdict, CaptureInput, DepthMap, DepthSource, FaceRegion, Size,
};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("analysis did not finish within {0:?}")]
    Timeout(Duration),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// One capture's worth of owned inputs.
pub struct AnalysisJob {
    pub image_size: Size,
    pub faces: Vec<FaceRegion>,
    pub depth: Option<DepthMap>,
    pub options: AnalysisOptions,
}

/// Messages sent from callers to the engine thread.
enum EngineRequest {
    Analyze {
        job: AnalysisJob,
        reply: oneshot::Sender<AntiSpoofingVerdict>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Queue a capture for analysis and wait up to `timeout` for its verdict.
    ///
    /// A timeout only abandons the wait; the worker still finishes the scan
    /// and its reply is dropped.
    pub async fn analyze(
        &self,
        job: AnalysisJob,
        timeout: Duration,
    ) -> Result<AntiSpoofingVerdict, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Analyze {
                job,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        tokio::time::timeout(timeout, reply_rx)
            .await
            .map_err(|_| EngineError::Timeout(timeout))?
            .map_err(|_| EngineError::ChannelClosed)
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// The per-pixel scan is CPU-bound, so it stays off the async runtime's
/// worker threads.
pub fn spawn_engine() -> Result<EngineHandle, EngineError> {
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    std::thread::Builder::new()
        .name("depthcheck-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Analyze { job, reply } => {
                        let verdict = run_analysis(&job);
                        let _ = reply.send(verdict);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .map_err(EngineError::Spawn)?;

    Ok(EngineHandle { tx })
}

fn run_analysis(job: &AnalysisJob) -> AntiSpoofingVerdict {
    tracing::debug!(
        faces = job.faces.len(),
        has_depth = job.depth.is_some(),
        debug = job.options.enable_debug,
        "analysis: job received"
    );
    let input = CaptureInput {
        image_size: job.image_size,
        faces: &job.faces,
        depth: job.depth.as_ref().map(|d| d as &dyn DepthSource),
    };
    depthcheck_core::analyze(&input, &job.options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use depthcheck_core::synthetic::{flat_plane, nose_bump};
    use depthcheck_core::{DepthEncoding, VerdictStatus};

    fn job_for(scene: depthcheck_core::synthetic::SyntheticCapture) -> AnalysisJob {
        AnalysisJob {
            image_size: scene.image_size,
            faces: vec![scene.face],
            depth: Some(scene.depth),
            options: AnalysisOptions::default(),
        }
    }

    #[tokio::test]
    async fn analyzes_on_worker_thread() {
        let engine = spawn_engine().unwrap();
        let timeout = Duration::from_secs(10);

        let v = engine
            .analyze(job_for(flat_plane(64, DepthEncoding::DepthFloat32)), timeout)
            .await
            .unwrap();
        assert_eq!(v.status, VerdictStatus::SpoofingDetected);

        let v = engine
            .analyze(job_for(nose_bump(128, DepthEncoding::DepthFloat32)), timeout)
            .await
            .unwrap();
        assert_eq!(v.status, VerdictStatus::Success);
    }

    #[tokio::test]
    async fn handle_is_shareable() {
        let engine = spawn_engine().unwrap();
        let other = engine.clone();
        let job = AnalysisJob {
            image_size: Size::new(64, 64),
            faces: Vec::new(),
            depth: None,
            options: AnalysisOptions::default(),
        };
        let v = other.analyze(job, Duration::from_secs(10)).await.unwrap();
        assert_eq!(v.status, VerdictStatus::NoFace);
    }
}
