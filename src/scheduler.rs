use crate::alphabet::Alphabet;
use crate::error::{DtmfPipeError, Result};
use crate::sink::AudioSink;
use crate::symbol::SymbolCode;
use log::{debug, error, info};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Playing,
    /// Transient: the current clip finished and the next one is being started.
    Advancing,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The current symbol is still sounding.
    Playing(SymbolCode),
    /// The previous symbol finished and this one started.
    Advanced(SymbolCode),
    /// The last queued symbol finished on this tick.
    Completed,
    Idle,
}

/// The symbol currently being rendered by the sink.
pub struct PlaybackSession<H> {
    pub symbol: SymbolCode,
    pub total: Duration,
    pub volume: f32,
    started: Instant,
    handle: H,
}

impl<H> PlaybackSession<H> {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed().min(self.total)
    }
}

/// Plays a symbol sequence clip by clip, advancing only when the sink
/// reports the current clip finished.
pub struct Scheduler<S: AudioSink> {
    alphabet: Arc<Alphabet>,
    sink: S,
    backup: Arc<[SymbolCode]>,
    queue: VecDeque<SymbolCode>,
    current: Option<PlaybackSession<S::Handle>>,
    state: SchedulerState,
    volume: f32,
}

impl<S: AudioSink> Scheduler<S> {
    /// Starts playing the first symbol right away when `symbols` is non-empty.
    pub fn new(
        symbols: Vec<SymbolCode>,
        alphabet: Arc<Alphabet>,
        sink: S,
        volume: f32,
    ) -> Result<Self> {
        let backup: Arc<[SymbolCode]> = symbols.into();

        let mut scheduler = Self {
            alphabet,
            sink,
            queue: backup.iter().copied().collect(),
            backup,
            current: None,
            state: SchedulerState::Idle,
            volume: volume.clamp(0.0, 1.0),
        };
        scheduler.start_next()?;

        Ok(scheduler)
    }

    /// Polls the sink once. Never blocks; repeated calls while the same clip
    /// is sounding change nothing.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        match self.state {
            SchedulerState::Error => Err(DtmfPipeError::Halted),
            SchedulerState::Idle => Ok(TickOutcome::Idle),
            SchedulerState::Playing | SchedulerState::Advancing => {
                if let Some(session) = &self.current {
                    if !self.sink.is_finished(&session.handle) {
                        return Ok(TickOutcome::Playing(session.symbol));
                    }
                    debug!("'{}' finished after {:?}", session.symbol, session.elapsed());
                }

                self.state = SchedulerState::Advancing;
                self.close_current();

                match self.start_next()? {
                    Some(symbol) => Ok(TickOutcome::Advanced(symbol)),
                    None => {
                        info!("Transmission complete ({} symbols)", self.backup.len());
                        Ok(TickOutcome::Completed)
                    }
                }
            }
        }
    }

    /// Restarts the whole sequence, cutting off any symbol in flight.
    pub fn replay(&mut self) -> Result<()> {
        if self.state == SchedulerState::Error {
            return Err(DtmfPipeError::Halted);
        }

        if let Some(session) = &self.current {
            debug!("Interrupting '{}' for replay", session.symbol);
        }
        self.close_current();

        self.queue = self.backup.iter().copied().collect();
        info!("Replaying {} symbols", self.queue.len());
        self.start_next()?;

        Ok(())
    }

    fn start_next(&mut self) -> Result<Option<SymbolCode>> {
        let Some(symbol) = self.queue.pop_front() else {
            self.state = SchedulerState::Idle;
            return Ok(None);
        };

        match self.open_session(symbol) {
            Ok(session) => {
                info!(
                    "Playing '{}' ({:?}, {} remaining)",
                    symbol,
                    session.total,
                    self.queue.len()
                );
                self.current = Some(session);
                self.state = SchedulerState::Playing;
                Ok(Some(symbol))
            }
            Err(e) => {
                error!("Cannot play '{}': {}", symbol, e);
                self.state = SchedulerState::Error;
                Err(e)
            }
        }
    }

    fn open_session(&mut self, symbol: SymbolCode) -> Result<PlaybackSession<S::Handle>> {
        let clip = self.alphabet.clip(symbol)?;
        let total = clip.duration();
        let handle = self.sink.play(clip, self.volume)?;

        Ok(PlaybackSession {
            symbol,
            total,
            volume: self.volume,
            started: Instant::now(),
            handle,
        })
    }

    fn close_current(&mut self) {
        if let Some(session) = self.current.take() {
            self.sink.close(session.handle);
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SchedulerState::Idle
    }

    pub fn current(&self) -> Option<&PlaybackSession<S::Handle>> {
        self.current.as_ref()
    }

    pub fn current_symbol(&self) -> Option<SymbolCode> {
        self.current.as_ref().map(|s| s.symbol)
    }

    /// Symbols still waiting to be played, not counting the current one.
    pub fn remaining(&self) -> impl Iterator<Item = SymbolCode> + '_ {
        self.queue.iter().copied()
    }

    pub fn remaining_len(&self) -> usize {
        self.queue.len()
    }

    pub fn backup(&self) -> &[SymbolCode] {
        &self.backup
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

impl<S: AudioSink> Drop for Scheduler<S> {
    fn drop(&mut self) {
        self.close_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::AudioClip;
    use crate::encoder::encode;
    use crate::symbol::SymbolCode::*;
    use std::collections::HashSet;

    /// Clips carry their symbol index as their only sample.
    fn tagged_alphabet() -> Arc<Alphabet> {
        let mut alphabet = Alphabet::default();
        for symbol in SymbolCode::ALL {
            alphabet.insert(symbol, AudioClip::new(vec![symbol.index() as f32], 1000));
        }
        Arc::new(alphabet)
    }

    #[derive(Default)]
    struct FakeSink {
        next_id: usize,
        open: HashSet<usize>,
        finished: HashSet<usize>,
        played: Vec<SymbolCode>,
        closed: usize,
        fail_on: Option<SymbolCode>,
    }

    impl FakeSink {
        fn finish_current(&mut self) {
            self.finished.extend(self.open.iter().copied());
        }
    }

    impl AudioSink for FakeSink {
        type Handle = usize;

        fn play(&mut self, clip: Arc<AudioClip>, _volume: f32) -> Result<usize> {
            let symbol = SymbolCode::ALL[clip.samples[0] as usize];
            if self.fail_on == Some(symbol) {
                return Err(DtmfPipeError::AudioDevice("device unplugged".into()));
            }
            self.played.push(symbol);
            self.next_id += 1;
            self.open.insert(self.next_id);
            Ok(self.next_id)
        }

        fn is_finished(&self, handle: &usize) -> bool {
            self.finished.contains(handle)
        }

        fn close(&mut self, handle: usize) {
            assert!(self.open.remove(&handle), "closed twice");
            self.closed += 1;
        }
    }

    fn scheduler(symbols: Vec<SymbolCode>) -> Scheduler<FakeSink> {
        Scheduler::new(symbols, tagged_alphabet(), FakeSink::default(), 1.0).unwrap()
    }

    #[test]
    fn test_starts_playing_first_symbol() {
        let s = scheduler(vec![D1, D2, D3]);
        assert_eq!(s.state(), SchedulerState::Playing);
        assert_eq!(s.current_symbol(), Some(D1));
        assert_eq!(s.remaining().collect::<Vec<_>>(), vec![D2, D3]);
        assert_eq!(s.sink().open.len(), 1);
    }

    #[test]
    fn test_unfinished_ticks_are_noops() {
        let mut s = scheduler(vec![D1, D2, D3]);
        for _ in 0..50 {
            assert_eq!(s.tick().unwrap(), TickOutcome::Playing(D1));
        }
        assert_eq!(s.remaining_len(), 2);
        assert_eq!(s.sink().played, vec![D1]);
    }

    #[test]
    fn test_advances_in_order_then_idles() {
        let mut s = scheduler(vec![D1, D2, D3]);

        s.sink_mut().finish_current();
        assert_eq!(s.tick().unwrap(), TickOutcome::Advanced(D2));
        assert_eq!(s.current_symbol(), Some(D2));
        assert_eq!(s.remaining().collect::<Vec<_>>(), vec![D3]);
        assert_eq!(s.sink().open.len(), 1);

        s.sink_mut().finish_current();
        assert_eq!(s.tick().unwrap(), TickOutcome::Advanced(D3));
        s.sink_mut().finish_current();
        assert_eq!(s.tick().unwrap(), TickOutcome::Completed);

        assert!(s.is_idle());
        assert!(s.current().is_none());
        assert!(s.sink().open.is_empty());
        assert_eq!(s.sink().closed, 3);
        assert_eq!(s.sink().played, vec![D1, D2, D3]);
        assert_eq!(s.tick().unwrap(), TickOutcome::Idle);
    }

    #[test]
    fn test_queue_is_always_suffix_of_backup() {
        let symbols = encode("hi");
        let mut s = scheduler(symbols.clone());

        while !s.is_idle() {
            let remaining: Vec<_> = s.remaining().collect();
            assert!(s.backup().ends_with(&remaining));
            assert!(s.sink().open.len() <= 1);
            s.sink_mut().finish_current();
            s.tick().unwrap();
        }
        assert_eq!(s.sink().played, symbols);
    }

    #[test]
    fn test_replay_interrupts_and_restarts() {
        let mut s = scheduler(vec![D1, D2, D3]);
        s.sink_mut().finish_current();
        s.tick().unwrap();
        assert_eq!(s.current_symbol(), Some(D2));

        s.replay().unwrap();
        assert_eq!(s.state(), SchedulerState::Playing);
        assert_eq!(s.current_symbol(), Some(D1));
        assert_eq!(s.remaining().collect::<Vec<_>>(), vec![D2, D3]);
        assert_eq!(s.sink().open.len(), 1);
        assert_eq!(s.sink().played, vec![D1, D2, D1]);
    }

    #[test]
    fn test_replay_from_idle() {
        let mut s = scheduler(vec![A, B]);
        for _ in 0..2 {
            s.sink_mut().finish_current();
            s.tick().unwrap();
        }
        assert!(s.is_idle());

        s.replay().unwrap();
        assert_eq!(s.current_symbol(), Some(A));
        assert_eq!(s.backup(), &[A, B]);
        assert_eq!(s.remaining().collect::<Vec<_>>(), vec![B]);
    }

    #[test]
    fn test_empty_sequence_is_idle() {
        let mut s = scheduler(Vec::new());
        assert!(s.is_idle());
        assert_eq!(s.tick().unwrap(), TickOutcome::Idle);
        s.replay().unwrap();
        assert!(s.is_idle());
        assert!(s.sink().played.is_empty());
    }

    #[test]
    fn test_missing_clip_halts_playback() {
        let mut alphabet = Alphabet::default();
        alphabet.insert(D1, AudioClip::new(vec![D1.index() as f32], 1000));
        let mut s = Scheduler::new(
            vec![D1, Pound, D1],
            Arc::new(alphabet),
            FakeSink::default(),
            1.0,
        )
        .unwrap();

        s.sink_mut().finish_current();
        let err = s.tick().unwrap_err();
        assert!(matches!(err, DtmfPipeError::ResourceResolution { symbol: Pound, .. }));
        assert_eq!(s.state(), SchedulerState::Error);
        assert!(s.sink().open.is_empty());

        assert!(matches!(s.tick(), Err(DtmfPipeError::Halted)));
        assert!(matches!(s.replay(), Err(DtmfPipeError::Halted)));
        assert_eq!(s.sink().played, vec![D1]);
    }

    #[test]
    fn test_sink_failure_on_first_symbol_is_fatal() {
        let sink = FakeSink {
            fail_on: Some(D7),
            ..Default::default()
        };
        let result = Scheduler::new(vec![D7, D8], tagged_alphabet(), sink, 1.0);
        assert!(matches!(result, Err(DtmfPipeError::AudioDevice(_))));
    }

    #[test]
    fn test_session_reports_clip_duration() {
        let s = scheduler(vec![C]);
        let session = s.current().unwrap();
        assert_eq!(session.symbol, C);
        assert_eq!(session.total, Duration::from_millis(1));
        assert!(session.elapsed() <= session.total);
        assert_eq!(session.volume, 1.0);
    }
}
