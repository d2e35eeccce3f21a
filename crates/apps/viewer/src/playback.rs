//! Fixed-rate transition playback.
//!
//! Commits without a transition render one frame at the event time. Commits
//! with one are sampled every frame step from the displayed state to the
//! target, eased per the transition; a newer commit interrupts the running
//! animation and starts from wherever it had got to.

use std::io::{self, Write};

use camera::{Easing, InputEvent, ViewportState};
use foundation::math::wrap_degrees;
use foundation::{Time, TimeSpan};
use serde::Serialize;
use tracing::{debug, info};

use crate::host::{Commit, ViewHost, Views};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub time_ms: f64,
    pub main: ViewportState,
    pub minimap: ViewportState,
}

/// Where rendered frames go.
pub trait FrameSink {
    fn render(&mut self, frame: &Frame) -> io::Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        self.push(*frame);
        Ok(())
    }
}

/// One JSON object per line.
pub struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> FrameSink for JsonLines<W> {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, frame)?;
        self.out.write_all(b"\n")
    }
}

/// Discards frames, keeping the last one.
#[derive(Debug, Default)]
pub struct FrameCounter {
    pub frames: usize,
    pub last: Option<Frame>,
}

impl FrameSink for FrameCounter {
    fn render(&mut self, frame: &Frame) -> io::Result<()> {
        self.frames += 1;
        self.last = Some(*frame);
        Ok(())
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Angle interpolation along the shorter arc.
fn lerp_degrees(a: f64, b: f64, t: f64) -> f64 {
    wrap_degrees(a + wrap_degrees(b - a) * t)
}

fn interpolate_state(from: &ViewportState, to: &ViewportState, t: f64) -> ViewportState {
    let mut position = to.position;
    for (i, p) in position.iter_mut().enumerate() {
        *p = lerp(from.position[i], to.position[i], t);
    }
    ViewportState {
        longitude: lerp_degrees(from.longitude, to.longitude, t),
        latitude: lerp(from.latitude, to.latitude, t),
        position,
        bearing: lerp_degrees(from.bearing, to.bearing, t),
        pitch: lerp(from.pitch, to.pitch, t),
        zoom: lerp(from.zoom, to.zoom, t),
        ..*to
    }
}

pub fn interpolate(from: &Views, to: &Views, t: f64) -> Views {
    Views {
        main: interpolate_state(&from.main, &to.main, t),
        minimap: interpolate_state(&from.minimap, &to.minimap, t),
    }
}

/// Frame times within this many seconds of the end snap to it.
const END_SNAP_S: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Animation {
    span: TimeSpan,
    easing: Easing,
    from: Views,
    to: Views,
    /// Index of the next frame to render; frame 0 is the commit itself.
    frame: u32,
}

impl Animation {
    fn sample(&self, t: Time) -> Views {
        let k = self.easing.apply(self.span.progress(t));
        interpolate(&self.from, &self.to, k)
    }

    fn frame_time(&self, frame_ms: f64) -> Time {
        let t = self.span.start.after_millis(f64::from(self.frame) * frame_ms);
        if t.0 >= self.span.end.0 - END_SNAP_S {
            self.span.end
        } else {
            t
        }
    }
}

#[derive(Debug)]
pub struct Playback {
    frame_ms: f64,
    active: Option<Animation>,
    frames: usize,
}

impl Playback {
    pub fn new(frame_rate_hz: f64) -> Self {
        Self {
            frame_ms: 1000.0 / frame_rate_hz,
            active: None,
            frames: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Render every frame of the running animation that falls before `now`.
    pub fn advance_to(&mut self, now: Time, sink: &mut dyn FrameSink) -> io::Result<()> {
        let Self {
            frame_ms,
            active,
            frames,
        } = self;
        let Some(anim) = active else {
            return Ok(());
        };

        loop {
            let t = anim.frame_time(*frame_ms);
            if t >= now {
                return Ok(());
            }
            let views = anim.sample(t);
            sink.render(&Frame {
                time_ms: t.as_millis(),
                main: views.main,
                minimap: views.minimap,
            })?;
            *frames += 1;

            if t >= anim.span.end {
                *active = None;
                return Ok(());
            }
            anim.frame += 1;
        }
    }

    /// Play out whatever is still running.
    pub fn finish(&mut self, sink: &mut dyn FrameSink) -> io::Result<()> {
        match self.active {
            Some(anim) => self.advance_to(anim.span.end.after_millis(self.frame_ms), sink),
            None => Ok(()),
        }
    }

    pub fn apply(&mut self, now: Time, commit: &Commit, sink: &mut dyn FrameSink) -> io::Result<()> {
        self.advance_to(now, sink)?;

        let from = match self.active.take() {
            Some(anim) => {
                debug!(at_ms = now.as_millis(), "transition interrupted");
                anim.sample(now)
            }
            None => commit.before,
        };

        match commit.transition {
            Some(spec) if spec.duration_ms > 0.0 => {
                let span = TimeSpan::starting_at(now, spec.duration_ms);
                self.active = Some(Animation {
                    span,
                    easing: spec.easing,
                    from,
                    to: commit.after,
                    frame: 1,
                });
                Ok(())
            }
            _ => {
                self.frames += 1;
                sink.render(&Frame {
                    time_ms: now.as_millis(),
                    main: commit.after.main,
                    minimap: commit.after.minimap,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub events: usize,
    pub consumed: usize,
    pub commits: usize,
    pub frames: usize,
}

/// Feed `events` through the host in order and render the resulting frames.
pub fn replay(
    host: &mut ViewHost,
    events: &[InputEvent],
    playback: &mut Playback,
    sink: &mut dyn FrameSink,
) -> io::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for event in events {
        let now = event.time();
        let dispatch = host.handle_event(event);
        summary.events += 1;
        if dispatch.consumed_by.is_some() {
            summary.consumed += 1;
        }
        for commit in &dispatch.commits {
            playback.apply(now, commit, sink)?;
            summary.commits += 1;
        }
        if dispatch.commits.is_empty() {
            playback.advance_to(now, sink)?;
        }
    }
    playback.finish(sink)?;
    summary.frames = playback.frames();

    info!(
        events = summary.events,
        consumed = summary.consumed,
        frames = summary.frames,
        "replay finished"
    );
    Ok(summary)
}
