use crate::{
    curve::compute_all_paths,
    frame::extract_frame,
    render::{LineHandle, RenderSink},
    timeline::ticks_since,
    AppConfig, CurveKind, CurvePaths, Frame, Path, Result, Timeline,
};

/// Order in which the timelines are registered, and therefore redrawn within
/// a pump.
pub const REGISTRATION_ORDER: [CurveKind; 3] = [CurveKind::Outer, CurveKind::Third, CurveKind::Base];

/// One timeline bound to the frame it refills and the line it redraws.
#[derive(Debug, Clone)]
pub struct Track {
    kind: CurveKind,
    timeline: Timeline,
    frame: Frame,
    line: LineHandle,
}

impl Track {
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn line(&self) -> LineHandle {
        self.line
    }

    fn start(&mut self, path: &Path, sink: &mut dyn RenderSink) -> Result<()> {
        let progress = self.timeline.start();
        self.redraw(path, progress, sink)
    }

    /// Advance, extract, redraw. Returns whether a redraw happened.
    fn advance(&mut self, path: &Path, delta_ms: u32, sink: &mut dyn RenderSink) -> Result<bool> {
        match self.timeline.advance(delta_ms) {
            Some(progress) => self.redraw(path, progress, sink).map(|()| true),
            None => Ok(false),
        }
    }

    fn redraw(&mut self, path: &Path, progress: usize, sink: &mut dyn RenderSink) -> Result<()> {
        extract_frame(path, progress, &mut self.frame);
        sink.set_line_points(self.line, self.frame.points())
    }
}

/// Owner of the three paths and the tracks animating them.
#[derive(Debug)]
pub struct Scene {
    paths: CurvePaths,
    tracks: Vec<Track>,
    last_pump_ms: Option<u32>,
}

impl Scene {
    /// Samples the paths and creates one styled line per curve on `sink`.
    pub fn new(config: &AppConfig, sink: &mut dyn RenderSink) -> Result<Self> {
        config.validate()?;

        let paths = compute_all_paths(&config.curve, config.curve_offsets());
        let sample_count = config.curve.sample_count();
        let frame_len = config.curve.frame_len();

        let lines = CurveKind::ALL.map(|kind| sink.create_line(config.style.line_style(kind)));

        let tracks = REGISTRATION_ORDER
            .into_iter()
            .map(|kind| Track {
                kind,
                timeline: Timeline::new(config.animation.duration_ms(kind), sample_count),
                frame: Frame::new(frame_len),
                line: lines[kind.index()],
            })
            .collect();

        tracing::debug!(sample_count, frame_len, "scene assembled");
        Ok(Self {
            paths,
            tracks,
            last_pump_ms: None,
        })
    }

    pub fn path(&self, kind: CurveKind) -> &Path {
        self.paths.get(kind)
    }

    pub fn paths(&self) -> &CurvePaths {
        &self.paths
    }

    pub fn track(&self, kind: CurveKind) -> Option<&Track> {
        self.tracks.iter().find(|track| track.kind == kind)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn frame(&self, kind: CurveKind) -> Option<&Frame> {
        self.track(kind).map(Track::frame)
    }

    pub fn is_started(&self) -> bool {
        self.last_pump_ms.is_some()
    }

    /// Starts every timeline and draws the first frames.
    pub fn start(&mut self, now_ms: u32, sink: &mut dyn RenderSink) -> Result<()> {
        for track in &mut self.tracks {
            track.start(self.paths.get(track.kind), sink)?;
        }
        self.last_pump_ms = Some(now_ms);
        tracing::info!(tracks = self.tracks.len(), "animation started");
        Ok(())
    }

    /// Advances every track by the time elapsed since the previous pump and
    /// redraws it. Returns the number of redraws.
    pub fn pump(&mut self, now_ms: u32, sink: &mut dyn RenderSink) -> Result<usize> {
        let Some(last) = self.last_pump_ms else {
            return Ok(0);
        };
        let delta = ticks_since(now_ms, last);
        self.last_pump_ms = Some(now_ms);

        let mut redraws = 0;
        for track in &mut self.tracks {
            if track.advance(self.paths.get(track.kind), delta, sink)? {
                redraws += 1;
            }
        }
        Ok(redraws)
    }

    /// Advances a single track, leaving the others untouched.
    pub fn advance(
        &mut self,
        kind: CurveKind,
        delta_ms: u32,
        sink: &mut dyn RenderSink,
    ) -> Result<bool> {
        let paths = &self.paths;
        match self.tracks.iter_mut().find(|track| track.kind == kind) {
            Some(track) => track.advance(paths.get(kind), delta_ms, sink),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::LineStyle, Color, Display, DisplayConfig, InfinityError, Point};

    const N: usize = 1256;
    const W: usize = 251;

    /// Records every redraw without rasterizing.
    #[derive(Default)]
    struct RecordingSink {
        styles: Vec<LineStyle>,
        redraws: Vec<(usize, Vec<Point>)>,
    }

    impl RenderSink for RecordingSink {
        fn create_line(&mut self, style: LineStyle) -> LineHandle {
            self.styles.push(style);
            LineHandle(self.styles.len() - 1)
        }

        fn set_line_points(&mut self, line: LineHandle, points: &[Point]) -> Result<()> {
            self.redraws.push((line.index(), points.to_vec()));
            Ok(())
        }
    }

    fn display() -> Display {
        Display::with_default_buffer(DisplayConfig::default()).unwrap()
    }

    #[test]
    fn creates_one_styled_line_per_curve() {
        let mut sink = RecordingSink::default();
        let scene = Scene::new(&AppConfig::default(), &mut sink).unwrap();

        let colors: Vec<Color> = sink.styles.iter().map(|style| style.color).collect();
        assert_eq!(
            colors,
            vec![
                Color::from_hex(0xFF6F61),
                Color::from_hex(0x32CD32),
                Color::from_hex(0x87CEEB),
            ]
        );
        assert!(sink.styles.iter().all(|style| style.width == 5));

        for kind in CurveKind::ALL {
            assert_eq!(scene.path(kind).len(), N);
            assert_eq!(scene.frame(kind).unwrap().len(), W);
        }
    }

    #[test]
    fn configured_width_reaches_lines_and_paths() {
        let config = AppConfig::from_json_str(r#"{ "style": { "line": { "width": 9 } } }"#).unwrap();
        let mut sink = RecordingSink::default();
        let scene = Scene::new(&config, &mut sink).unwrap();

        assert!(sink.styles.iter().all(|style| style.width == 9));
        assert_eq!(scene.path(CurveKind::Outer)[0], Point::new(128, 88));
        assert_eq!(scene.path(CurveKind::Third)[0], Point::new(146, 88));
    }

    #[test]
    fn tracks_are_bound_to_their_own_lines() {
        let mut sink = RecordingSink::default();
        let scene = Scene::new(&AppConfig::default(), &mut sink).unwrap();

        let kinds: Vec<CurveKind> = scene.tracks().iter().map(Track::kind).collect();
        assert_eq!(kinds, REGISTRATION_ORDER.to_vec());
        for track in scene.tracks() {
            assert_eq!(track.line().index(), track.kind().index());
        }
    }

    #[test]
    fn start_draws_first_frames() {
        let mut display = display();
        let mut scene = Scene::new(&AppConfig::default(), &mut display).unwrap();
        scene.start(0, &mut display).unwrap();

        for track in scene.tracks() {
            let path = scene.path(track.kind());
            assert_eq!(track.frame().points(), &path.points()[..W]);
            assert_eq!(display.line(track.line()).unwrap().points(), track.frame().points());
        }
    }

    #[test]
    fn pump_before_start_does_nothing() {
        let mut sink = RecordingSink::default();
        let mut scene = Scene::new(&AppConfig::default(), &mut sink).unwrap();

        assert_eq!(scene.pump(1000, &mut sink).unwrap(), 0);
        assert!(sink.redraws.is_empty());
        assert!(!scene.is_started());
    }

    #[test]
    fn pump_moves_each_track_at_its_own_speed() {
        let mut display = display();
        let mut scene = Scene::new(&AppConfig::default(), &mut display).unwrap();
        scene.start(0, &mut display).unwrap();

        assert_eq!(scene.pump(1000, &mut display).unwrap(), 3);

        let expected = [
            (CurveKind::Base, 1000 * N / 4000),
            (CurveKind::Outer, 1000 * N / 6000),
            (CurveKind::Third, 1000 * N / 8000),
        ];
        for (kind, progress) in expected {
            let track = scene.track(kind).unwrap();
            assert_eq!(track.timeline().progress(), progress);
            assert_eq!(track.frame().points()[0], scene.path(kind)[progress]);
        }
    }

    #[test]
    fn redraws_follow_registration_order() {
        let mut sink = RecordingSink::default();
        let mut scene = Scene::new(&AppConfig::default(), &mut sink).unwrap();
        scene.start(0, &mut sink).unwrap();
        sink.redraws.clear();

        scene.pump(5, &mut sink).unwrap();

        let order: Vec<usize> = sink.redraws.iter().map(|(line, _)| *line).collect();
        // Lines are created base, outer, third.
        assert_eq!(order, vec![1, 2, 0]);
        assert!(sink.redraws.iter().all(|(_, points)| points.len() == W));
    }

    #[test]
    fn advancing_one_track_leaves_other_frames_alone() {
        let mut display = display();
        let mut scene = Scene::new(&AppConfig::default(), &mut display).unwrap();
        scene.start(0, &mut display).unwrap();

        let outer = scene.frame(CurveKind::Outer).unwrap().clone();
        let third = scene.frame(CurveKind::Third).unwrap().clone();
        let base = scene.frame(CurveKind::Base).unwrap().clone();

        assert!(scene.advance(CurveKind::Base, 2000, &mut display).unwrap());

        assert_ne!(scene.frame(CurveKind::Base).unwrap(), &base);
        assert_eq!(scene.frame(CurveKind::Outer).unwrap(), &outer);
        assert_eq!(scene.frame(CurveKind::Third).unwrap(), &third);
    }

    #[test]
    fn pump_handles_tick_counter_wrap() {
        let mut sink = RecordingSink::default();
        let mut scene = Scene::new(&AppConfig::default(), &mut sink).unwrap();
        scene.start(u32::MAX - 499, &mut sink).unwrap();

        scene.pump(500, &mut sink).unwrap();

        let base = scene.track(CurveKind::Base).unwrap();
        assert_eq!(base.timeline().elapsed_ms(), 1000);
    }

    #[test]
    fn full_cycle_returns_to_path_start() {
        let mut sink = RecordingSink::default();
        let mut scene = Scene::new(&AppConfig::default(), &mut sink).unwrap();
        scene.start(0, &mut sink).unwrap();

        scene.pump(4000, &mut sink).unwrap();

        let base = scene.track(CurveKind::Base).unwrap();
        assert_eq!(base.timeline().progress(), 0);
        assert_eq!(base.frame().points()[0], scene.path(CurveKind::Base)[0]);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut config = AppConfig::default();
        config.curve.frame_fraction = 0.0;
        let mut sink = RecordingSink::default();

        let err = Scene::new(&config, &mut sink).unwrap_err();
        assert!(matches!(err, InfinityError::InvalidConfig(_)));
        assert!(sink.styles.is_empty());
    }
}
