//! Cyclic track layout, boundary linking and ray tracing

// crate modules
use crate::cache::{self, TrackFile};
use crate::error::{Error, Result};
use crate::quadrature::AzimuthalQuadrature;
use crate::track::{Segment, Track, TrackEnd, TrackLink};

// standard library
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;
use std::path::{Path, PathBuf};

// moctools modules
use moctools_geometry::{BoundaryType, Bounds, Direction, Geometry, Point, Side};
use moctools_utils::ValueExt;

// external crates
use kdam::par_tqdm;
use log::{debug, info, warn};
use rayon::prelude::*;

/// Step past a crossing used to find the next region
const NUDGE: f64 = 1e-10;

/// Upper limit on ray tracing steps along a single track
const MAX_STEPS: usize = 1_000_000;

/// Track ends closer than this fraction of the domain size coincide
const LINK_TOLERANCE: f64 = 1e-9;

/// Sorted positions of track ends, keyed by (angle, side, is start)
type EndIndex = HashMap<(usize, Side, bool), Vec<(f64, usize)>>;

/// Generates and ray traces cyclic tracks over a geometry
///
/// Parameters are checked on construction, so an invalid number of angles
/// or spacing fails before any work is done. The expensive work happens in
/// [generate_tracks()](TrackGenerator::generate_tracks).
///
/// ```rust
/// # use moctools_geometry::Geometry;
/// # use moctools_tracks::{Error, TrackGenerator};
/// # let geometry = Geometry::new();
/// // tracks need the bounds of an initialised geometry
/// let result = TrackGenerator::new(&geometry, 4, 0.1);
/// assert!(matches!(result, Err(Error::GeometryError(_))));
/// ```
#[derive(Debug)]
pub struct TrackGenerator<'a> {
    geometry: &'a Geometry,
    bounds: Bounds,
    quadrature: AzimuthalQuadrature,
    spacing: f64,
    tracks: Vec<Track>,
    fsr_volumes: Vec<f64>,
    cache_directory: Option<PathBuf>,
    disable_progress: bool,
}

impl<'a> TrackGenerator<'a> {
    /// Check the tracking parameters against an initialised geometry
    ///
    /// `num_azim` counts angles over `[0, 2pi)` and must be a positive
    /// multiple of 4. `spacing` is the requested track spacing in cm.
    pub fn new(geometry: &'a Geometry, num_azim: usize, spacing: f64) -> Result<Self> {
        let bounds = geometry.bounds()?;
        let quadrature =
            AzimuthalQuadrature::new(num_azim, spacing, bounds.width(), bounds.height())?;

        Ok(Self {
            geometry,
            bounds,
            quadrature,
            spacing,
            tracks: Vec::new(),
            fsr_volumes: Vec::new(),
            cache_directory: None,
            disable_progress: false,
        })
    }

    /// Read and write tracks from this directory
    pub fn set_cache_directory<P: AsRef<Path>>(&mut self, directory: P) {
        self.cache_directory = Some(directory.as_ref().to_path_buf());
    }

    /// Disable the progress bar printed during ray tracing
    pub fn disable_progress(&mut self) {
        self.disable_progress = true;
    }

    /// Lay out, link and ray trace every track
    ///
    /// Tracks are loaded instead when a cache directory is set and holds a
    /// file for the same geometry and parameters.
    pub fn generate_tracks(&mut self) -> Result<()> {
        if self.load_cache()? {
            return Ok(());
        }

        info!(
            "Generating tracks: {} angles, {} cm spacing",
            self.quadrature.num_azim(),
            self.spacing
        );

        let mut tracks = self.lay_tracks();
        self.link_tracks(&mut tracks)?;
        self.tracks = tracks;
        self.segmentize()?;
        self.fsr_volumes = self.compute_volumes();

        info!(
            "Generated {} tracks with {} segments",
            self.num_tracks(),
            self.num_segments()
        );

        self.save_cache();
        Ok(())
    }

    pub fn is_generated(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn geometry(&self) -> &'a Geometry {
        self.geometry
    }

    pub fn quadrature(&self) -> &AzimuthalQuadrature {
        &self.quadrature
    }

    /// Number of angles over `[0, 2pi)`
    pub fn num_azim(&self) -> usize {
        self.quadrature.num_azim()
    }

    /// Requested track spacing
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// All tracks, grouped by angle
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn num_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn num_segments(&self) -> usize {
        self.tracks.iter().map(|t| t.num_segments()).sum()
    }

    /// Numerical area of every FSR from the track segments
    pub fn fsr_volumes(&self) -> &[f64] {
        &self.fsr_volumes
    }

    /// Weight of a track in angular integrals, azimuthal weight x spacing
    pub fn track_weight(&self, track: &Track) -> f64 {
        self.quadrature.weight(track.azim) * self.quadrature.spacing(track.azim)
    }

    /// Track positions, before linking and ray tracing
    fn lay_tracks(&self) -> Vec<Track> {
        let b = self.bounds;
        let q = &self.quadrature;
        let mut tracks = Vec::new();

        for azim in 0..q.num_angles() {
            let phi = q.phi(azim);
            let (nx, ny) = (q.num_x(azim), q.num_y(azim));
            let (dx, dy) = (q.dx(azim), q.dy(azim));
            let rising = phi < FRAC_PI_2;

            let bottom = (0..nx).map(|k| {
                let x = match rising {
                    true => b.x_min + dx * (nx as f64 - k as f64 - 0.5),
                    false => b.x_min + dx * (k as f64 + 0.5),
                };
                (Point::new(x, b.y_min), Side::Bottom)
            });

            let sides = (0..ny).map(|k| {
                let y = b.y_min + dy * (k as f64 + 0.5);
                match rising {
                    true => (Point::new(b.x_min, y), Side::Left),
                    false => (Point::new(b.x_max, y), Side::Right),
                }
            });

            for (start, start_side) in bottom.chain(sides) {
                let (end, end_side) = exit_point(&b, start, phi);
                tracks.push(Track {
                    uid: tracks.len(),
                    azim,
                    phi,
                    start: TrackEnd {
                        point: start,
                        side: start_side,
                        boundary: b.boundary(start_side),
                        link: None,
                    },
                    end: TrackEnd {
                        point: end,
                        side: end_side,
                        boundary: b.boundary(end_side),
                        link: None,
                    },
                    segments: Vec::new(),
                });
            }
        }

        debug!("Laid out {} tracks", tracks.len());
        tracks
    }

    /// Connect every reflective or periodic track end to its continuation
    fn link_tracks(&self, tracks: &mut [Track]) -> Result<()> {
        let index = end_index(tracks);
        let tolerance = LINK_TOLERANCE * (self.bounds.width() + self.bounds.height());

        for t in 0..tracks.len() {
            for at_start in [true, false] {
                let track = &tracks[t];
                let end = match at_start {
                    true => track.start,
                    false => track.end,
                };

                let link = match end.boundary {
                    BoundaryType::Vacuum | BoundaryType::Interface => None,
                    BoundaryType::Reflective => {
                        Some(self.reflective_link(&index, track, at_start, tolerance))
                    }
                    BoundaryType::Periodic => {
                        Some(self.periodic_link(&index, track, at_start, tolerance))
                    }
                };

                let link = match link {
                    Some(found) => Some(found.ok_or_else(|| Error::UnpairedTrack {
                        track: t,
                        end: match at_start {
                            true => "start".to_string(),
                            false => "end".to_string(),
                        },
                    })?),
                    None => None,
                };

                match at_start {
                    true => tracks[t].start.link = link,
                    false => tracks[t].end.link = link,
                }
            }
        }

        Ok(())
    }

    /// Flux continues along the mirrored direction from the same point
    fn reflective_link(
        &self,
        index: &EndIndex,
        track: &Track,
        at_start: bool,
        tolerance: f64,
    ) -> Option<TrackLink> {
        let end = if at_start { track.start } else { track.end };
        let outgoing = outgoing_direction(track, at_start);

        let reflected = match end.side {
            Side::Left | Side::Right => Direction {
                ux: -outgoing.ux,
                uy: outgoing.uy,
            },
            Side::Bottom | Side::Top => Direction {
                ux: outgoing.ux,
                uy: -outgoing.uy,
            },
        };

        let azim = self.quadrature.complement(track.azim);
        let along = Direction::from_angle(self.quadrature.phi(azim));
        let forward = reflected.ux * along.ux + reflected.uy * along.uy > 0.0;

        find_end(index, (azim, end.side, forward), end.point, tolerance)
            .map(|track| TrackLink { track, forward })
    }

    /// Flux continues in the same direction from the opposite side
    fn periodic_link(
        &self,
        index: &EndIndex,
        track: &Track,
        at_start: bool,
        tolerance: f64,
    ) -> Option<TrackLink> {
        let b = &self.bounds;
        let end = if at_start { track.start } else { track.end };

        let (side, point) = match end.side {
            Side::Left => (Side::Right, Point::new(b.x_max, end.point.y)),
            Side::Right => (Side::Left, Point::new(b.x_min, end.point.y)),
            Side::Bottom => (Side::Top, Point::new(end.point.x, b.y_max)),
            Side::Top => (Side::Bottom, Point::new(end.point.x, b.y_min)),
        };

        // leaving through the end means travelling forward
        let forward = !at_start;
        find_end(index, (track.azim, side, forward), point, tolerance)
            .map(|track| TrackLink { track, forward })
    }

    /// Split every track into segments, in parallel
    fn segmentize(&mut self) -> Result<()> {
        let geometry = self.geometry;

        let segments = par_tqdm!(
            self.tracks
                .par_iter()
                .map(|track| segment_track(geometry, track).map(|s| (track.uid, s))),
            bar_format = "Ray tracing: {count}/{total} [{rate:.2} tracks/s]  ",
            disable = self.disable_progress
        )
        .collect::<Result<Vec<(usize, Vec<Segment>)>>>();

        if !self.disable_progress {
            eprintln!();
        }

        for (uid, segments) in segments? {
            self.tracks[uid].segments = segments;
        }
        Ok(())
    }

    fn compute_volumes(&self) -> Vec<f64> {
        let mut volumes = vec![0.0; self.geometry.num_fsrs()];
        for track in &self.tracks {
            let weight = self.track_weight(track);
            for segment in &track.segments {
                volumes[segment.fsr] += weight * segment.length;
            }
        }

        for (fsr, _) in volumes.iter().enumerate().filter(|(_, v)| **v == 0.0) {
            warn!("FSR {fsr} is not crossed by any track, consider a finer spacing");
        }
        debug!(
            "Total FSR volume {} cm^2",
            volumes.iter().sum::<f64>().sci(5, 2)
        );
        volumes
    }

    fn cache_path(&self) -> Result<Option<PathBuf>> {
        let Some(directory) = &self.cache_directory else {
            return Ok(None);
        };
        let name = cache::file_name(self.geometry.signature()?, self.num_azim(), self.spacing);
        Ok(Some(directory.join(name)))
    }

    /// Try to load tracks from the cache, returning true on success
    fn load_cache(&mut self) -> Result<bool> {
        let Some(path) = self.cache_path()? else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }

        let signature = self.geometry.signature()?;
        let expected: usize = (0..self.quadrature.num_angles())
            .map(|i| self.quadrature.num_tracks(i))
            .sum();

        match cache::read_tracks(&path) {
            Ok(file)
                if file.matches(signature, self.num_azim(), self.spacing)
                    && file.tracks.len() == expected
                    && file.fsr_volumes.len() == self.geometry.num_fsrs() =>
            {
                info!("Loaded {} tracks from {}", file.tracks.len(), path.display());
                self.tracks = file.tracks;
                self.fsr_volumes = file.fsr_volumes;
                Ok(true)
            }
            Ok(_) => {
                warn!("Ignoring stale track file {}", path.display());
                Ok(false)
            }
            Err(e) => {
                warn!("Unable to read track file {}: {e}", path.display());
                Ok(false)
            }
        }
    }

    /// Write tracks to the cache directory, failures are only logged
    fn save_cache(&self) {
        let path = match self.cache_path() {
            Ok(Some(path)) => path,
            _ => return,
        };

        let file = TrackFile {
            signature: self.geometry.signature().unwrap_or_default(),
            num_azim: self.num_azim(),
            spacing: self.spacing,
            tracks: self.tracks.clone(),
            fsr_volumes: self.fsr_volumes.clone(),
        };

        match cache::write_tracks(&path, &file) {
            Ok(()) => info!("Tracks written to {}", path.display()),
            Err(e) => warn!("Unable to write track file {}: {e}", path.display()),
        }
    }
}

/// Where a ray leaving `start` at angle `phi` meets the domain boundary
fn exit_point(bounds: &Bounds, start: Point, phi: f64) -> (Point, Side) {
    let (cos, sin) = (phi.cos(), phi.sin());
    let to_top = (bounds.y_max - start.y) / sin;
    let (to_side, x, side) = match cos > 0.0 {
        true => ((bounds.x_max - start.x) / cos, bounds.x_max, Side::Right),
        false => ((bounds.x_min - start.x) / cos, bounds.x_min, Side::Left),
    };

    if to_side < to_top {
        (Point::new(x, start.y + to_side * sin), side)
    } else {
        (Point::new(start.x + to_top * cos, bounds.y_max), Side::Top)
    }
}

/// Direction of flux leaving a track through one of its ends
fn outgoing_direction(track: &Track, at_start: bool) -> Direction {
    match at_start {
        true => track.direction().reverse(),
        false => track.direction(),
    }
}

/// Position of a point along the side it sits on
fn coordinate(side: Side, point: Point) -> f64 {
    match side {
        Side::Left | Side::Right => point.y,
        Side::Bottom | Side::Top => point.x,
    }
}

fn end_index(tracks: &[Track]) -> EndIndex {
    let mut index = EndIndex::new();
    for track in tracks {
        for (end, is_start) in [(track.start, true), (track.end, false)] {
            index
                .entry((track.azim, end.side, is_start))
                .or_default()
                .push((coordinate(end.side, end.point), track.uid));
        }
    }
    for ends in index.values_mut() {
        ends.sort_by(|a, b| a.0.total_cmp(&b.0));
    }
    index
}

/// Track with an end at `point`, if any
fn find_end(
    index: &EndIndex,
    key: (usize, Side, bool),
    point: Point,
    tolerance: f64,
) -> Option<usize> {
    let ends = index.get(&key)?;
    let target = coordinate(key.1, point);
    let i = ends.partition_point(|(c, _)| *c < target - tolerance);
    ends.get(i)
        .filter(|(c, _)| (c - target).abs() <= tolerance)
        .map(|(_, uid)| *uid)
}

/// Walk a track through the geometry, merging consecutive chords in the
/// same FSR
///
/// Segment lengths are differences of the running position, so they sum
/// to the track length.
pub(crate) fn segment_track(geometry: &Geometry, track: &Track) -> Result<Vec<Segment>> {
    let direction = track.direction();
    let length = track.length();
    let origin = track.start.point;

    let mut segments: Vec<Segment> = Vec::new();
    let mut position = 0.0;
    let mut steps = 0;

    while length - position > 2.0 * NUDGE {
        steps += 1;
        if steps > MAX_STEPS {
            return Err(Error::SegmentationStalled(track.uid));
        }

        let inside = origin.advance(direction, position + NUDGE);
        let location = geometry.locate(inside)?;
        let next = (position + NUDGE + geometry.distance_to_boundary(&location, direction))
            .min(length);

        match segments.last_mut() {
            Some(last) if last.fsr == location.fsr => last.length += next - position,
            _ => segments.push(Segment {
                fsr: location.fsr,
                length: next - position,
            }),
        }
        position = next;
    }

    // whatever is left is shorter than the nudge
    if let Some(last) = segments.last_mut() {
        last.length += length - position;
    }

    Ok(segments)
}
