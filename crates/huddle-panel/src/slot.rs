//! Participant display slot
//!
//! A [`ParticipantSlot`] is one tile of the panel: name text, a pair of
//! mutually exclusive mic indicators, an amplitude fill bar and a video
//! surface shown through the slot's own render target.

use std::fmt;

use huddle_core::{ParticipantId, RenderTarget, VideoSurfaceHandle};
use serde::{Deserialize, Serialize};

/// One display tile of the panel
///
/// A slot is either unbound or bound to exactly one participant. Its render
/// target is owned exclusively and released when the slot is dropped.
pub struct ParticipantSlot {
    index: usize,
    participant: Option<ParticipantId>,
    name: String,
    mic_on_visible: bool,
    mic_off_visible: bool,
    amplitude: f32,
    video: Option<VideoSurfaceHandle>,
    render_target: Option<Box<dyn RenderTarget>>,
}

impl fmt::Debug for ParticipantSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticipantSlot")
            .field("index", &self.index)
            .field("participant", &self.participant)
            .field("name", &self.name)
            .field("mic_on", &self.mic_on_visible)
            .field("amplitude", &self.amplitude)
            .field("video", &self.video)
            .field("has_render_target", &self.render_target.is_some())
            .finish()
    }
}

impl ParticipantSlot {
    /// Create an unbound slot that shows video through `render_target`
    pub fn new(index: usize, render_target: Box<dyn RenderTarget>) -> Self {
        Self::build(index, Some(render_target))
    }

    /// Create an unbound slot with no render target (video never attaches)
    #[cfg(test)]
    fn without_render_target(index: usize) -> Self {
        Self::build(index, None)
    }

    fn build(index: usize, render_target: Option<Box<dyn RenderTarget>>) -> Self {
        Self {
            index,
            participant: None,
            name: String::new(),
            mic_on_visible: false,
            mic_off_visible: true,
            amplitude: 0.0,
            video: None,
            render_target,
        }
    }

    /// Bind this slot to a participant
    ///
    /// Any previous binding is cleared first. Empty names and the bare
    /// `Player` placeholder fall back to `Player {id}`.
    pub fn bind(
        &mut self,
        participant: ParticipantId,
        display_name: &str,
        video: Option<&VideoSurfaceHandle>,
    ) {
        self.clear();
        self.participant = Some(participant);
        self.name = participant.display_name_or_fallback(display_name);
        self.try_set_video_feed(video);
    }

    /// Attach a video surface, or detach with `None`
    ///
    /// Returns true only when a surface is now shown. Without a render
    /// target the slot always ends up detached.
    pub fn try_set_video_feed(&mut self, surface: Option<&VideoSurfaceHandle>) -> bool {
        let Some(target) = self.render_target.as_mut() else {
            self.video = None;
            return false;
        };

        match surface {
            Some(surface) => {
                target.attach(surface);
                self.video = Some(surface.clone());
                true
            }
            None => {
                target.detach();
                self.video = None;
                false
            }
        }
    }

    /// Show exactly one of the two mic indicators
    pub fn set_mic_state(&mut self, is_speaking: bool) {
        self.mic_on_visible = is_speaking;
        self.mic_off_visible = !is_speaking;
    }

    /// Set the amplitude fill, clamped to `0.0..=1.0` (NaN reads as silence)
    pub fn set_amplitude(&mut self, value: f32) {
        self.amplitude = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    /// Replace the shown name, with the same fallback rule as [`bind`](Self::bind)
    pub fn set_name(&mut self, name: &str) {
        if let Some(participant) = self.participant {
            self.name = participant.display_name_or_fallback(name);
        }
    }

    /// Reset every display field and drop the binding
    pub fn clear(&mut self) {
        self.name.clear();
        self.try_set_video_feed(None);
        self.set_mic_state(false);
        self.set_amplitude(0.0);
        self.participant = None;
    }

    /// Position of this slot in the panel
    pub fn index(&self) -> usize {
        self.index
    }

    /// Participant bound to this slot
    pub fn participant(&self) -> Option<ParticipantId> {
        self.participant
    }

    /// Whether the slot is bound
    pub fn is_bound(&self) -> bool {
        self.participant.is_some()
    }

    /// Name text
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the mic-on indicator is shown
    pub fn is_mic_on(&self) -> bool {
        self.mic_on_visible
    }

    /// Whether the mic-off indicator is shown
    pub fn is_mic_off(&self) -> bool {
        self.mic_off_visible
    }

    /// Amplitude fill in `0.0..=1.0`
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Whether a video surface is currently shown
    pub fn is_video_set(&self) -> bool {
        self.video.is_some()
    }

    /// The surface currently shown
    pub fn video_surface(&self) -> Option<&VideoSurfaceHandle> {
        self.video.as_ref()
    }

    /// Read-only snapshot of the display fields
    pub fn view(&self) -> SlotView {
        SlotView {
            index: self.index,
            participant: self.participant,
            name: self.name.clone(),
            mic_on: self.mic_on_visible,
            amplitude: self.amplitude,
            video: self.video.as_ref().map(|v| v.label.clone()),
        }
    }
}

/// Serializable snapshot of a slot's display fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub index: usize,
    pub participant: Option<ParticipantId>,
    pub name: String,
    pub mic_on: bool,
    pub amplitude: f32,
    pub video: Option<String>,
}

impl fmt::Display for SlotView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.participant {
            None => write!(f, "[{}] <empty>", self.index),
            Some(participant) => write!(
                f,
                "[{}] {} ({}) mic={} amp={:.2} video={}",
                self.index,
                self.name,
                participant,
                if self.mic_on { "on" } else { "off" },
                self.amplitude,
                self.video.as_deref().unwrap_or("-")
            ),
        }
    }
}
