use crate::alphabet::AudioClip;
use crate::error::Result;
use std::sync::Arc;

/// An output that renders one clip at a time and can be polled for
/// completion without blocking.
pub trait AudioSink {
    type Handle;

    /// Starts playback immediately.
    fn play(&mut self, clip: Arc<AudioClip>, volume: f32) -> Result<Self::Handle>;

    fn is_finished(&self, handle: &Self::Handle) -> bool;

    fn close(&mut self, handle: Self::Handle);
}
