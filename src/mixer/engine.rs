//! Mixer engine - the single owner of all console state
//!
//! The control loop holds one [`MixerEngine`] and calls [`MixerEngine::poll`]
//! once per iteration. A poll runs, in order:
//!
//! 1. encoders: rotation and mute toggles mutate channels, mark activity and dirty
//! 2. buttons: mark activity without dirtying
//! 3. idle handling: edges flush pending state and reset the screen, the fader
//!    steps on elapsed time, the idle animation runs while idle
//! 4. telemetry: emitted on its own interval

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use super::activity::{ActivityClock, IdleEdge, IdleEdgeDetector};
use super::buttons::ButtonBank;
use super::channel::{ChannelState, Direction};
use super::encoder::{EncoderChannel, PinLevels};
use super::fader::{BrightnessFader, MAX_BRIGHTNESS};
use super::leds::{ring_frame, LedProfile};
use super::screen::ScreenState;
use super::telemetry::TelemetryEncoder;
use crate::config::{AppConfig, ButtonConfig, ChannelConfig, TimingConfig};
use crate::drivers::{DisplaySink, LedRing, Peripherals, PinSource, TelemetrySink};
use crate::storage::{ChannelRecord, EepromMedium, PersistenceStore, StorageError};

/// Everything the engine needs from the configuration, with the channel count fixed
#[derive(Debug, Clone)]
pub struct EngineSettings<const N: usize> {
    pub channels: [ChannelConfig; N],
    pub volume_step: u8,
    pub timing: TimingConfig,
    pub leds: LedProfile,
    pub buttons: ButtonConfig,
}

impl<const N: usize> EngineSettings<N> {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let channels: [ChannelConfig; N] =
            config.mixer.channels.clone().try_into().map_err(|v: Vec<ChannelConfig>| {
                anyhow!("Engine is built for {} channels, config has {}", N, v.len())
            })?;

        Ok(Self {
            channels,
            volume_step: config.mixer.volume_step,
            timing: config.timing.clone(),
            leds: config.leds.profile(),
            buttons: config.buttons.clone(),
        })
    }
}

/// What happened during one poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Channels changed by encoder input
    pub changed_channels: Vec<usize>,
    /// Buttons held during this poll
    pub buttons_pressed: Vec<usize>,
    pub edge: Option<IdleEdge>,
    /// Bytes written to the medium by an idle flush, if one happened
    pub flushed: Option<usize>,
    pub brightness_changed: bool,
    /// Telemetry line sent this poll
    pub telemetry: Option<String>,
}

/// State engine of an `N` channel console
pub struct MixerEngine<M: EepromMedium, const N: usize> {
    channels: [ChannelState; N],
    encoders: [EncoderChannel; N],
    settings: EngineSettings<N>,
    clock: ActivityClock,
    idle_edge: IdleEdgeDetector,
    fader: BrightnessFader,
    telemetry: TelemetryEncoder,
    screen: ScreenState,
    buttons: ButtonBank,
    store: PersistenceStore<M, N>,
}

impl<M: EepromMedium, const N: usize> MixerEngine<M, N> {
    /// Start the engine: prepare the stored record, load channel state and seed
    /// the encoders with the current pin levels
    pub fn boot<P: PinSource>(
        settings: EngineSettings<N>,
        medium: M,
        pins: &mut P,
        now_ms: u64,
    ) -> Result<Self, StorageError> {
        let mut store = PersistenceStore::new(medium)?;
        if store.initialize_if_needed() {
            if let Err(e) = store.commit() {
                warn!("Failed to commit default record: {:#}", anyhow::Error::from(e));
            }
        }

        let channels = store.load().map(ChannelState::from);
        let encoders =
            std::array::from_fn(|i| EncoderChannel::new(pins.read_digital(settings.channels[i].pins.a)));

        let timing = &settings.timing;
        let engine = Self {
            channels,
            encoders,
            clock: ActivityClock::new(timing.idle_timeout_ms, now_ms),
            idle_edge: IdleEdgeDetector::new(),
            fader: BrightnessFader::new(timing.fade_profile(), MAX_BRIGHTNESS, now_ms),
            telemetry: TelemetryEncoder::new(timing.telemetry_interval_ms, now_ms),
            screen: ScreenState::new(N, timing.idle_animation_frame_ms, now_ms),
            buttons: ButtonBank::new(
                settings.buttons.pins.clone(),
                settings.buttons.press_threshold,
            ),
            store,
            settings,
        };

        for (i, channel) in engine.channels.iter().enumerate() {
            debug!(
                "Channel {} '{}': volume {}{}",
                i,
                engine.settings.channels[i].name,
                channel.volume(),
                if channel.is_muted() { " (muted)" } else { "" }
            );
        }
        info!("Mixer engine started with {} channels", N);

        Ok(engine)
    }

    /// Run one poll cycle
    pub fn poll<P, L, D, T>(&mut self, now_ms: u64, io: &mut Peripherals<P, L, D, T>) -> PollReport
    where
        P: PinSource,
        L: LedRing,
        D: DisplaySink,
        T: TelemetrySink,
    {
        let mut report = PollReport::default();

        self.check_encoders(now_ms, io, &mut report);
        self.check_buttons(now_ms, &mut io.pins, &mut report);
        self.check_idle(now_ms, io, &mut report);

        if let Some(line) = self.telemetry.poll(now_ms, &self.channels) {
            if let Err(e) = io.telemetry.send_line(&line) {
                warn!("Failed to send telemetry: {}", e);
            }
            report.telemetry = Some(line);
        }

        report
    }

    fn check_encoders<P, L, D, T>(
        &mut self,
        now_ms: u64,
        io: &mut Peripherals<P, L, D, T>,
        report: &mut PollReport,
    ) where
        P: PinSource,
        L: LedRing,
        D: DisplaySink,
    {
        for i in 0..N {
            let pins = self.settings.channels[i].pins;
            let levels = PinLevels {
                a: io.pins.read_digital(pins.a),
                b: io.pins.read_digital(pins.b),
                switch: io.pins.read_digital(pins.switch),
            };
            let events = self.encoders[i].decode(levels);
            if events.is_empty() {
                continue;
            }

            if let Some(direction) = events.rotation {
                self.apply_step(i, direction);
            }
            if events.toggle {
                let muted = self.channels[i].toggle_mute();
                debug!("Channel {} {}", i, if muted { "muted" } else { "unmuted" });
            }

            self.screen.select(i);
            self.clock.mark_activity(now_ms, true);
            self.render_channel(i, &mut io.leds);
            io.leds.show();
            let volumes = self.volumes();
            self.screen.show_volume(&volumes, &mut io.display);
            report.changed_channels.push(i);
        }
    }

    fn check_buttons<P: PinSource>(&mut self, now_ms: u64, pins: &mut P, report: &mut PollReport) {
        let pressed = self.buttons.pressed(pins);
        for &button in &pressed {
            debug!("Button {} pressed", button + 1);
            self.clock.mark_activity(now_ms, false);
        }
        report.buttons_pressed = pressed;
    }

    fn check_idle<P, L, D, T>(
        &mut self,
        now_ms: u64,
        io: &mut Peripherals<P, L, D, T>,
        report: &mut PollReport,
    ) where
        L: LedRing,
        D: DisplaySink,
    {
        let idle = self.clock.is_idle(now_ms);

        report.edge = self.idle_edge.update(idle);
        match report.edge {
            Some(IdleEdge::BecameIdle) => {
                debug!("Console became idle");
                if self.clock.pending_persist() {
                    match self.flush() {
                        Ok(written) => report.flushed = Some(written),
                        Err(e) => warn!(
                            "Failed to persist mixer state, will retry: {:#}",
                            anyhow::Error::from(e)
                        ),
                    }
                }
                self.screen.enter_idle(now_ms, &mut io.display);
            }
            Some(IdleEdge::BecameActive) => {
                debug!("Console became active");
            }
            None => {}
        }

        if self.fader.tick(now_ms, idle) {
            for i in 0..N {
                self.render_channel(i, &mut io.leds);
            }
            io.leds.show();
            report.brightness_changed = true;
        }

        if idle {
            self.screen.animate(now_ms, &mut io.display);
        }
    }

    fn apply_step(&mut self, channel: usize, direction: Direction) {
        let volume = self.channels[channel].apply_step(direction, self.settings.volume_step);
        debug!("Channel {} {} -> {}", channel, direction, volume);
    }

    fn render_channel<L: LedRing>(&self, channel: usize, leds: &mut L) {
        let frame = ring_frame(
            &self.channels[channel],
            self.settings.channels[channel].color,
            self.fader.level(),
            &self.settings.leds,
        );
        leds.set_channel(channel, frame);
    }

    /// Push every ring's frame; used once after boot
    pub fn render_all<L: LedRing>(&self, leds: &mut L) {
        for i in 0..N {
            self.render_channel(i, leds);
        }
        leds.show();
    }

    /// Write channel state to the medium (changed bytes only) and commit
    ///
    /// The pending flag is cleared only once the commit succeeds.
    fn flush(&mut self) -> Result<usize, StorageError> {
        let records: [ChannelRecord; N] = std::array::from_fn(|i| ChannelRecord::from(&self.channels[i]));
        let written = self.store.save(&records);
        self.store.commit()?;
        self.clock.mark_persisted();
        info!("💾 Mixer state persisted ({} bytes written)", written);
        Ok(written)
    }

    /// Flush pending changes now, e.g. before shutdown
    ///
    /// Returns `Ok(true)` if something was pending and is now persisted. On
    /// error the changes stay pending.
    pub fn persist_pending(&mut self) -> Result<bool, StorageError> {
        if !self.clock.pending_persist() {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }

    pub fn channels(&self) -> &[ChannelState; N] {
        &self.channels
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.settings.channels.iter().map(|c| c.name.as_str())
    }

    fn volumes(&self) -> [u8; N] {
        self.channels.map(|c| c.volume())
    }

    pub fn brightness(&self) -> u8 {
        self.fader.level()
    }

    pub fn is_idle(&self, now_ms: u64) -> bool {
        self.clock.is_idle(now_ms)
    }

    pub fn pending_persist(&self) -> bool {
        self.clock.pending_persist()
    }

    pub fn selected_channel(&self) -> Option<usize> {
        self.screen.current()
    }

    pub fn store(&self) -> &PersistenceStore<M, N> {
        &self.store
    }
}
