//! Gesture messages and the reducer that turns them into animation targets.
//!
//! Messages arrive as one JSON object per line:
//! `{"hands": [{"side": "right", "pinch_finger": "middle", ...}]}`.
//! The reducer only ever writes [`GestureTargets`]; smoothing happens in the
//! integrator.

use std::str::FromStr;

use serde::Deserialize;
use tracing::debug;

use crate::config::{AnimationConfig, GestureConfig};
use crate::error::MessageError;
use crate::shapes::ShapeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub fn label(self) -> &'static str {
        match self {
            Finger::Index => "index",
            Finger::Middle => "middle",
            Finger::Ring => "ring",
            Finger::Pinky => "pinky",
        }
    }
}

impl FromStr for Finger {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "index" => Ok(Finger::Index),
            "middle" => Ok(Finger::Middle),
            "ring" => Ok(Finger::Ring),
            "pinky" => Ok(Finger::Pinky),
            _ => Err(()),
        }
    }
}

/// Normalized thumb-to-fingertip distances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FingerDistances {
    pub index: Option<f32>,
    pub middle: Option<f32>,
    pub ring: Option<f32>,
    pub pinky: Option<f32>,
}

/// One hand in one message.
#[derive(Debug, Clone, PartialEq)]
pub struct HandEvent {
    pub side: Side,
    pub pinch: Option<Finger>,
    pub finger_distance: FingerDistances,
    pub hand_size_norm: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureMessage {
    pub timestamp: Option<f64>,
    pub hands: Vec<HandEvent>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    t: Option<f64>,
    hands: Vec<WireHand>,
}

// Positions and the raw index distance are carried by the producer but not
// used here; they are accepted so strict producers stay valid.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
#[allow(dead_code)]
struct WireHand {
    hand_id: Option<u32>,
    side: Option<String>,
    pinch_finger: Option<String>,
    pinch_distance_norm: Option<f32>,
    finger_dist_norm: FingerDistances,
    hand_size_norm: Option<f32>,
    index: Option<[f32; 2]>,
    thumb: Option<[f32; 2]>,
    distance_norm: Option<f32>,
}

impl WireHand {
    fn into_event(self) -> Option<HandEvent> {
        let side = match self.side.as_deref().map(str::parse::<Side>) {
            Some(Ok(side)) => side,
            _ => {
                debug!(side = ?self.side, "dropping hand without a usable side");
                return None;
            }
        };
        let pinch = match self.pinch_finger.as_deref() {
            None | Some("none") | Some("") => None,
            Some(name) => match name.parse::<Finger>() {
                Ok(finger) => Some(finger),
                Err(()) => {
                    debug!(finger = name, "unknown pinch finger, treating as no pinch");
                    None
                }
            },
        };
        Some(HandEvent {
            side,
            pinch,
            finger_distance: self.finger_dist_norm,
            hand_size_norm: self.hand_size_norm.unwrap_or(0.0),
        })
    }
}

/// Decode one line of the gesture stream.
pub fn parse_message(line: &str) -> Result<GestureMessage, MessageError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(MessageError::Empty);
    }
    let wire: WireMessage = serde_json::from_str(line)?;
    Ok(GestureMessage {
        timestamp: wire.t,
        hands: wire.hands.into_iter().filter_map(WireHand::into_event).collect(),
    })
}

/// Control targets written by the reducer and read by the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureTargets {
    pub active_shape: ShapeKind,
    /// +1 or -1.
    pub rotation_direction: f32,
    pub speed_boost: f32,
    pub zoom_target: f32,
    pub frozen: bool,
    pub right_pinch_active: bool,
    pub left_pinch_active: bool,
    pub summary: HandSummary,
}

impl GestureTargets {
    pub fn new(anim: &AnimationConfig) -> Self {
        Self {
            active_shape: ShapeKind::Sphere,
            rotation_direction: 1.0,
            speed_boost: 0.0,
            zoom_target: anim.initial_zoom.clamp(anim.min_zoom, anim.max_zoom),
            frozen: false,
            right_pinch_active: false,
            left_pinch_active: false,
            summary: HandSummary::default(),
        }
    }
}

/// What the last message contained, for status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandSummary {
    pub hands: usize,
    pub left_pinch: Option<Finger>,
    pub right_pinch: Option<Finger>,
}

/// Clamp `value` into `[min, max]` and rescale to `0..1`.
fn normalize(value: f32, min: f32, max: f32) -> f32 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Apply one message to `current`, returning the updated targets.
/// Hands are handled in order; when a side repeats, the last one wins.
pub fn reduce(
    current: &GestureTargets,
    message: &GestureMessage,
    gestures: &GestureConfig,
    anim: &AnimationConfig,
) -> GestureTargets {
    let mut next = *current;
    let left = message.hands.iter().rev().find(|h| h.side == Side::Left);
    let right = message.hands.iter().rev().find(|h| h.side == Side::Right);

    next.summary = HandSummary {
        hands: message.hands.len(),
        left_pinch: left.and_then(|h| h.pinch),
        right_pinch: right.and_then(|h| h.pinch),
    };

    match right {
        Some(hand) => {
            if let Some(shape) = hand.pinch.and_then(|f| gestures.right_pinch.shape_for(f)) {
                next.active_shape = shape;
            }
            next.right_pinch_active = hand.pinch.is_some();
        }
        None => next.right_pinch_active = false,
    }

    match left {
        Some(hand) => {
            if let Some(d) = hand.finger_distance.index {
                next.speed_boost = if d >= gestures.max_finger_distance {
                    0.0
                } else {
                    let closeness = 1.0
                        - normalize(d, gestures.min_finger_distance, gestures.max_finger_distance);
                    closeness * gestures.max_speed_boost
                };
            }
            if hand.pinch == Some(Finger::Middle) {
                let size = normalize(hand.hand_size_norm, gestures.min_hand_size, gestures.max_hand_size);
                let zoom = anim.max_zoom - size * (anim.max_zoom - anim.min_zoom);
                next.zoom_target = zoom.clamp(anim.min_zoom, anim.max_zoom);
            }
            match hand.pinch {
                Some(Finger::Ring) => next.rotation_direction = -1.0,
                Some(Finger::Pinky) => {}
                _ => next.rotation_direction = 1.0,
            }
            next.frozen = hand.pinch == Some(Finger::Pinky);
            next.left_pinch_active = hand.pinch.is_some();
        }
        None => {
            next.rotation_direction = 1.0;
            next.frozen = false;
            next.left_pinch_active = false;
        }
    }

    next
}
