//! Camera session state machine.
//!
//! The session never talks to a camera API directly. It hands out
//! [`AcquireRequest`]s that the host fulfils asynchronously, and reports the
//! outcome back through [`CaptureSession::complete`]. Every request carries a
//! fresh [`RequestId`]; only the most recent pending id is accepted, so a
//! superseded request that resolves late has its stream stopped and is
//! otherwise ignored.
//!
//! The session exclusively owns at most one stream. Any new request, and
//! unmounting, first stops that stream through [`CaptureDevice::stop`].

use super::types::{
    AcquireRequest, CaptureConstraints, CaptureError, CaptureStatus, FacingMode, RequestId,
    TorchWarning,
};

/// Host operations on acquired streams.
pub trait CaptureDevice {
    /// A live stream handle. Ownership moves into the session on success and
    /// back out to [`CaptureDevice::stop`] on release.
    type Stream;

    /// Stop every track of `stream`.
    fn stop(&mut self, stream: Self::Stream);

    /// Whether the stream's video track reports a torch capability.
    fn torch_capable(&self, stream: &Self::Stream) -> bool;

    /// Apply the torch constraint to the stream's video track.
    fn apply_torch(&mut self, stream: &Self::Stream, on: bool) -> Result<(), String>;
}

pub struct CaptureSession<D: CaptureDevice> {
    device: D,
    constraints: CaptureConstraints,
    facing_mode: FacingMode,
    status: CaptureStatus,
    stream: Option<D::Stream>,
    pending: Option<RequestId>,
    next_request: u64,
    mounted: bool,
    torch_capable: bool,
    torch_on: bool,
    /// Last torch state the user asked for; re-applied after reacquisition.
    torch_desired: bool,
}

impl<D: CaptureDevice> CaptureSession<D> {
    pub fn new(device: D, facing_mode: FacingMode, constraints: CaptureConstraints) -> Self {
        Self {
            device,
            constraints,
            facing_mode,
            status: CaptureStatus::Idle,
            stream: None,
            pending: None,
            next_request: 0,
            mounted: false,
            torch_capable: false,
            torch_on: false,
            torch_desired: false,
        }
    }

    /// Start the first acquisition.
    pub fn mount(&mut self) -> AcquireRequest {
        self.mounted = true;
        self.request()
    }

    /// Stop the stream and discard any in-flight acquisition.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.pending = None;
        self.release();
        self.set_status(CaptureStatus::Idle);
    }

    /// Switch cameras.
    ///
    /// Returns the acquisition to start, or `None` when the mode is already
    /// active or being requested, or the session is not mounted. Re-setting
    /// the same mode after a failure retries.
    pub fn set_facing_mode(&mut self, mode: FacingMode) -> Option<AcquireRequest> {
        let busy = matches!(
            self.status,
            CaptureStatus::Active | CaptureStatus::Requesting
        );
        if mode == self.facing_mode && busy {
            return None;
        }
        self.facing_mode = mode;
        if !self.mounted {
            return None;
        }
        Some(self.request())
    }

    pub fn toggle_facing_mode(&mut self) -> Option<AcquireRequest> {
        self.set_facing_mode(self.facing_mode.toggled())
    }

    /// Report the outcome of an acquisition.
    ///
    /// Returns `false` when the result belongs to a superseded request; a
    /// stream carried by such a result is stopped immediately.
    pub fn complete(&mut self, id: RequestId, result: Result<D::Stream, CaptureError>) -> bool {
        if self.pending != Some(id) {
            match result {
                Ok(stream) => {
                    log::warn!("Discarding stream from superseded request {}", id.0);
                    self.device.stop(stream);
                }
                Err(e) => log::debug!("Ignoring failure of superseded request {}: {e}", id.0),
            }
            return false;
        }
        self.pending = None;

        match result {
            Ok(stream) => {
                self.torch_capable = self.device.torch_capable(&stream);
                self.torch_on = false;
                self.stream = Some(stream);
                self.set_status(CaptureStatus::Active);
                if self.torch_desired && self.torch_capable {
                    // the outcome is already logged; desired state is kept either way
                    let _ = self.apply_torch(true);
                }
            }
            Err(e) => {
                log::error!("Camera acquisition failed: {e}");
                self.set_status(CaptureStatus::Failed(e));
            }
        }
        true
    }

    /// Turn the flashlight on or off.
    ///
    /// Torch control is best-effort: every failure comes back as a
    /// [`TorchWarning`], is logged, and leaves `status` and `torch_on`
    /// untouched. No device call is made unless the active track is capable.
    pub fn set_torch(&mut self, on: bool) -> Result<(), TorchWarning> {
        self.torch_desired = on;
        if self.status != CaptureStatus::Active || self.stream.is_none() {
            log::warn!("{}", TorchWarning::NotActive);
            return Err(TorchWarning::NotActive);
        }
        if !self.torch_capable {
            log::warn!("{}", TorchWarning::Unsupported);
            return Err(TorchWarning::Unsupported);
        }
        self.apply_torch(on)
    }

    pub fn toggle_torch(&mut self) -> Result<(), TorchWarning> {
        self.set_torch(!self.torch_on)
    }

    fn apply_torch(&mut self, on: bool) -> Result<(), TorchWarning> {
        let Some(stream) = self.stream.as_ref() else {
            return Err(TorchWarning::NotActive);
        };
        match self.device.apply_torch(stream, on) {
            Ok(()) => {
                self.torch_on = on;
                Ok(())
            }
            Err(reason) => {
                let warning = TorchWarning::ApplyFailed(reason);
                log::warn!("{warning}");
                Err(warning)
            }
        }
    }

    fn request(&mut self) -> AcquireRequest {
        self.release();
        self.next_request += 1;
        let id = RequestId(self.next_request);
        self.pending = Some(id);
        self.set_status(CaptureStatus::Requesting);
        AcquireRequest {
            id,
            facing_mode: self.facing_mode,
            constraints: self.constraints,
        }
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.device.stop(stream);
        }
        self.torch_capable = false;
        self.torch_on = false;
    }

    fn set_status(&mut self, status: CaptureStatus) {
        if self.status != status {
            log::debug!(
                "Capture {} -> {} ({})",
                self.status.name(),
                status.name(),
                self.facing_mode.as_str()
            );
        }
        self.status = status;
    }

    pub fn status(&self) -> &CaptureStatus {
        &self.status
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    pub fn constraints(&self) -> CaptureConstraints {
        self.constraints
    }

    pub fn is_mirrored(&self) -> bool {
        self.facing_mode.is_mirrored()
    }

    pub fn torch_capable(&self) -> bool {
        self.torch_capable
    }

    pub fn torch_on(&self) -> bool {
        self.torch_on
    }

    /// The live stream, present only while `Active`.
    pub fn stream(&self) -> Option<&D::Stream> {
        self.stream.as_ref()
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.pending
    }

    /// User-visible banner text for a failed acquisition.
    pub fn error_message(&self) -> Option<String> {
        match &self.status {
            CaptureStatus::Failed(e) => Some(e.to_string()),
            _ => None,
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: CaptureDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MockStream {
        id: u32,
        torch: bool,
    }

    #[derive(Debug, Default)]
    struct MockDevice {
        stopped: Vec<u32>,
        torch_calls: Vec<(u32, bool)>,
        fail_torch: bool,
    }

    impl CaptureDevice for MockDevice {
        type Stream = MockStream;

        fn stop(&mut self, stream: MockStream) {
            self.stopped.push(stream.id);
        }

        fn torch_capable(&self, stream: &MockStream) -> bool {
            stream.torch
        }

        fn apply_torch(&mut self, stream: &MockStream, on: bool) -> Result<(), String> {
            self.torch_calls.push((stream.id, on));
            if self.fail_torch {
                Err("OverconstrainedError".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn stream(id: u32) -> MockStream {
        MockStream { id, torch: false }
    }

    fn torch_stream(id: u32) -> MockStream {
        MockStream { id, torch: true }
    }

    fn session() -> CaptureSession<MockDevice> {
        CaptureSession::new(
            MockDevice::default(),
            FacingMode::Environment,
            CaptureConstraints::default(),
        )
    }

    fn active_session(s: MockStream) -> CaptureSession<MockDevice> {
        let mut session = session();
        let req = session.mount();
        assert!(session.complete(req.id, Ok(s)));
        session
    }

    #[test]
    fn test_mount_requests_environment_camera() {
        let mut session = session();
        assert_eq!(session.status(), &CaptureStatus::Idle);

        let req = session.mount();
        assert_eq!(req.facing_mode, FacingMode::Environment);
        assert_eq!(req.constraints.ideal_width, 1920);
        assert_eq!(req.constraints.ideal_height, 1080);
        assert_eq!(session.status(), &CaptureStatus::Requesting);
        assert_eq!(session.pending_request(), Some(req.id));
    }

    #[test]
    fn test_successful_acquisition() {
        let session = active_session(torch_stream(1));
        assert_eq!(session.status(), &CaptureStatus::Active);
        assert!(session.torch_capable());
        assert!(!session.torch_on());
        assert_eq!(session.stream(), Some(&torch_stream(1)));
        assert_eq!(session.pending_request(), None);
    }

    #[test]
    fn test_rapid_toggles_leave_one_stream() {
        let mut session = active_session(stream(1));

        let to_user = session.toggle_facing_mode().unwrap();
        assert_eq!(to_user.facing_mode, FacingMode::User);
        // stopped before the new request started
        assert_eq!(session.device().stopped, vec![1]);

        let to_env = session.toggle_facing_mode().unwrap();
        assert_eq!(to_env.facing_mode, FacingMode::Environment);

        assert!(!session.complete(to_user.id, Ok(stream(2))));
        assert!(session.complete(to_env.id, Ok(stream(3))));

        assert_eq!(session.status(), &CaptureStatus::Active);
        assert_eq!(session.facing_mode(), FacingMode::Environment);
        assert_eq!(session.stream().map(|s| s.id), Some(3));
        assert_eq!(session.device().stopped, vec![1, 2]);
    }

    #[test]
    fn test_toggles_before_first_result() {
        let mut session = session();
        let first = session.mount();
        let second = session.toggle_facing_mode().unwrap();
        let third = session.toggle_facing_mode().unwrap();

        assert!(!session.complete(first.id, Ok(stream(1))));
        assert!(!session.complete(second.id, Ok(stream(2))));
        assert!(session.complete(third.id, Ok(stream(3))));

        assert_eq!(session.stream().map(|s| s.id), Some(3));
        assert_eq!(session.device().stopped, vec![1, 2]);
    }

    #[test]
    fn test_acquisition_failure_is_retryable() {
        let mut session = session();
        let req = session.mount();
        assert!(session.complete(req.id, Err(CaptureError::PermissionDenied)));
        assert_eq!(
            session.status(),
            &CaptureStatus::Failed(CaptureError::PermissionDenied)
        );
        assert_eq!(
            session.error_message().as_deref(),
            Some("Failed to access camera. Please ensure permissions are granted.")
        );

        let retry = session.set_facing_mode(FacingMode::Environment).unwrap();
        assert_eq!(session.status(), &CaptureStatus::Requesting);
        assert!(session.complete(retry.id, Ok(stream(7))));
        assert_eq!(session.status(), &CaptureStatus::Active);
        assert_eq!(session.error_message(), None);
    }

    #[test]
    fn test_same_facing_mode_while_active_is_noop() {
        let mut session = active_session(stream(1));
        assert!(session.set_facing_mode(FacingMode::Environment).is_none());
        assert!(session.device().stopped.is_empty());
        assert_eq!(session.status(), &CaptureStatus::Active);
    }

    #[test]
    fn test_facing_mode_before_mount_is_stored() {
        let mut session = session();
        assert!(session.set_facing_mode(FacingMode::User).is_none());
        assert_eq!(session.facing_mode(), FacingMode::User);
        assert!(session.is_mirrored());
        assert_eq!(session.mount().facing_mode, FacingMode::User);
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let mut session = session();
        let first = session.mount();
        let second = session.toggle_facing_mode().unwrap();
        assert!(!session.complete(first.id, Err(CaptureError::PermissionDenied)));
        assert_eq!(session.status(), &CaptureStatus::Requesting);
        assert!(session.complete(second.id, Ok(stream(2))));
        assert_eq!(session.status(), &CaptureStatus::Active);
    }

    #[test]
    fn test_unmount_stops_stream_and_discards_in_flight() {
        let mut session = active_session(stream(1));
        let pending = session.toggle_facing_mode().unwrap();
        session.unmount();
        assert_eq!(session.status(), &CaptureStatus::Idle);

        assert!(!session.complete(pending.id, Ok(stream(2))));
        assert_eq!(session.device().stopped, vec![1, 2]);
        assert!(session.stream().is_none());
    }

    #[test]
    fn test_torch_on_incapable_track_makes_no_call() {
        let mut session = active_session(stream(1));
        assert_eq!(session.set_torch(true), Err(TorchWarning::Unsupported));
        assert!(!session.torch_on());
        assert!(session.device().torch_calls.is_empty());
        assert_eq!(session.status(), &CaptureStatus::Active);
    }

    #[test]
    fn test_torch_on_capable_track() {
        let mut session = active_session(torch_stream(1));
        assert_eq!(session.set_torch(true), Ok(()));
        assert!(session.torch_on());
        assert_eq!(session.toggle_torch(), Ok(()));
        assert!(!session.torch_on());
        assert_eq!(session.device().torch_calls, vec![(1, true), (1, false)]);
    }

    #[test]
    fn test_torch_failure_keeps_status() {
        let mut session = active_session(torch_stream(1));
        session.device.fail_torch = true;
        assert!(matches!(
            session.set_torch(true),
            Err(TorchWarning::ApplyFailed(_))
        ));
        assert!(!session.torch_on());
        assert_eq!(session.status(), &CaptureStatus::Active);
    }

    #[test]
    fn test_torch_while_requesting() {
        let mut session = session();
        session.mount();
        assert_eq!(session.set_torch(true), Err(TorchWarning::NotActive));
        assert!(session.device().torch_calls.is_empty());
    }

    #[test]
    fn test_torch_reapplied_after_reacquisition() {
        let mut session = active_session(torch_stream(1));
        session.set_torch(true).unwrap();

        let req = session.toggle_facing_mode().unwrap();
        assert!(!session.torch_on());
        session.complete(req.id, Ok(torch_stream(2)));
        assert!(session.torch_on());
        assert_eq!(session.device().torch_calls, vec![(1, true), (2, true)]);

        // the next camera has no torch
        let req = session.toggle_facing_mode().unwrap();
        session.complete(req.id, Ok(stream(3)));
        assert!(!session.torch_on());
        assert!(!session.torch_capable());
        assert_eq!(session.device().torch_calls.len(), 2);
    }
}
