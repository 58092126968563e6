//! Tracks, segments and boundary links

// external crates
use moctools_geometry::{BoundaryType, Direction, Point, Side};
use serde::{Deserialize, Serialize};

/// Chord of a track through one flat source region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub fsr: usize,
    pub length: f64,
}

/// Where angular flux goes after leaving a track
///
/// `forward` is true when the flux enters `track` at its start and travels
/// along it, false when it enters at the end and travels backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackLink {
    pub track: usize,
    pub forward: bool,
}

/// Boundary condition and continuation at one end of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackEnd {
    pub point: Point,
    pub side: Side,
    pub boundary: BoundaryType,
    /// Continuation of flux leaving through this end, `None` for vacuum
    pub link: Option<TrackLink>,
}

/// Characteristic line across the whole domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Index into every track of the generator
    pub uid: usize,
    /// Azimuthal angle index in `[0, pi)`
    pub azim: usize,
    pub phi: f64,
    pub start: TrackEnd,
    pub end: TrackEnd,
    pub segments: Vec<Segment>,
}

impl Track {
    pub fn length(&self) -> f64 {
        self.start.point.distance_to(self.end.point)
    }

    /// Direction of travel from start to end
    pub fn direction(&self) -> Direction {
        Direction::from_angle(self.phi)
    }

    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Continuation of flux leaving the track
    ///
    /// Flux travelling forward leaves through the end, flux travelling
    /// backward leaves through the start.
    pub fn outgoing(&self, forward: bool) -> Option<TrackLink> {
        match forward {
            true => self.end.link,
            false => self.start.link,
        }
    }

    /// Boundary condition met by flux leaving in one direction
    pub fn outgoing_boundary(&self, forward: bool) -> BoundaryType {
        match forward {
            true => self.end.boundary,
            false => self.start.boundary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_ends() {
        let link = TrackLink {
            track: 3,
            forward: false,
        };
        let track = Track {
            uid: 0,
            azim: 0,
            phi: 0.5,
            start: TrackEnd {
                point: Point::new(0.0, 0.0),
                side: Side::Bottom,
                boundary: BoundaryType::Vacuum,
                link: None,
            },
            end: TrackEnd {
                point: Point::new(3.0, 4.0),
                side: Side::Top,
                boundary: BoundaryType::Reflective,
                link: Some(link),
            },
            segments: vec![],
        };

        assert_eq!(track.length(), 5.0);
        assert_eq!(track.outgoing(true), Some(link));
        assert_eq!(track.outgoing(false), None);
        assert_eq!(track.outgoing_boundary(false), BoundaryType::Vacuum);
    }
}
