//! SceneModel - driver markers for the track map

use std::collections::{BTreeMap, HashMap};

use crate::error::SinkError;
use crate::session::types::SessionInfo;
use crate::sinks::FrameSink;
use crate::types::{DriverCode, DriverColor, Frame, TyreCompound};

/// One driver's marker on the map
#[derive(Debug, Clone, PartialEq)]
pub struct DriverMarker {
    pub code: DriverCode,
    pub x: f64,
    pub y: f64,
    pub color: DriverColor,
    pub drs_active: bool,
    pub tyre: TyreCompound,
    /// Whether the driver was present in the most recent frame
    pub visible: bool,
}

/// Marker set for the current session.
///
/// A marker is created the first time a driver appears and is kept until the
/// next session, even if the driver later drops out of the frames (the
/// marker then stays at its last position and is flagged not visible).
#[derive(Debug, Default)]
pub struct SceneModel {
    markers: BTreeMap<DriverCode, DriverMarker>,
    colors: HashMap<DriverCode, DriverColor>,
    frame_index: Option<usize>,
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markers(&self) -> impl Iterator<Item = &DriverMarker> {
        self.markers.values()
    }

    pub fn marker(&self, code: &str) -> Option<&DriverMarker> {
        self.markers.get(code)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Index of the last frame applied
    pub fn frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    /// Apply a frame
    pub fn update(&mut self, frame: &Frame) {
        for marker in self.markers.values_mut() {
            marker.visible = false;
        }

        for (code, state) in &frame.drivers {
            let marker = self.markers.entry(code.clone()).or_insert_with(|| DriverMarker {
                code: code.clone(),
                x: state.x,
                y: state.y,
                color: self.colors.get(code).copied().unwrap_or_default(),
                drs_active: false,
                tyre: TyreCompound::Unknown,
                visible: true,
            });
            marker.x = state.x;
            marker.y = state.y;
            marker.drs_active = state.drs_active;
            marker.tyre = state.tyre_compound;
            marker.visible = true;
        }

        self.frame_index = Some(frame.index);
    }

    /// Drop every marker and take colours from the new roster
    pub fn reset(&mut self, session: &SessionInfo) {
        self.markers.clear();
        self.frame_index = None;
        self.colors = session
            .drivers
            .iter()
            .map(|d| (d.code.clone(), d.color))
            .collect();
    }
}

impl FrameSink for SceneModel {
    fn name(&self) -> &str {
        "SceneModel"
    }

    fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.update(frame);
        Ok(())
    }

    fn on_session(&mut self, session: &SessionInfo) {
        self.reset(session);
    }
}
