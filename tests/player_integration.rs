use image::{Rgba, RgbaImage};
use image_looper::config::Configuration;
use image_looper::error::{DecodeError, PlayerError};
use image_looper::player::timer::Clock;
use image_looper::render::compositor::Background;
use image_looper::render::loader::{DecodedImage, Decoder, ImageDecoder};
use image_looper::render::surface::Canvas;
use image_looper::{ImageDescriptor, ImagePlayer, create_player};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};
use tempfile::{TempDir, tempdir};

const RED: [u8; 3] = [255, 0, 0];
const GREEN: [u8; 3] = [0, 255, 0];
const BLUE: [u8; 3] = [0, 0, 255];
const WHITE: [u8; 3] = [255, 255, 255];

#[derive(Clone)]
struct ManualClock(Rc<Cell<Instant>>);

impl ManualClock {
    fn new() -> Self {
        Self(Rc::new(Cell::new(Instant::now())))
    }

    fn advance(&self, d: Duration) {
        self.0.set(self.0.get() + d);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

/// Stock decoder that records how often it was asked to decode.
#[derive(Clone, Default)]
struct CountingDecoder {
    inner: ImageDecoder,
    calls: Rc<Cell<usize>>,
}

impl Decoder for CountingDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedImage, DecodeError> {
        self.calls.set(self.calls.get() + 1);
        self.inner.decode(path)
    }
}

type TestPlayer = ImagePlayer<Canvas, CountingDecoder, ManualClock>;

struct Fixture {
    dir: TempDir,
    clock: ManualClock,
    calls: Rc<Cell<usize>>,
    player: TestPlayer,
}

fn config(wait_time: u64) -> Configuration {
    let mut cfg = Configuration::default();
    cfg.image_player.duration = 5;
    cfg.image_player.scale = true;
    cfg.image_player.center = true;
    cfg.looper.bgcolor = BLUE;
    cfg.looper.wait_time = wait_time;
    cfg
}

fn fixture_with(cfg: Configuration, screen: (u32, u32)) -> Fixture {
    let background = Background::solid(cfg.looper.bgcolor);
    fixture_with_background(cfg, screen, background)
}

fn fixture_with_background(
    cfg: Configuration,
    screen: (u32, u32),
    background: Background,
) -> Fixture {
    let clock = ManualClock::new();
    let decoder = CountingDecoder::default();
    let calls = decoder.calls.clone();
    let player = ImagePlayer::with_parts(
        &cfg,
        Canvas::new(screen.0, screen.1),
        background,
        decoder,
        clock.clone(),
    );
    Fixture {
        dir: tempdir().unwrap(),
        clock,
        calls,
        player,
    }
}

fn fixture(wait_time: u64) -> Fixture {
    fixture_with(config(wait_time), (800, 600))
}

fn write_png(dir: &Path, name: &str, w: u32, h: u32, rgb: [u8; 3]) -> PathBuf {
    let path = dir.join(name);
    RgbaImage::from_pixel(w, h, Rgba([rgb[0], rgb[1], rgb[2], 255]))
        .save(&path)
        .unwrap();
    path
}

fn assert_color(canvas: &Canvas, x: u32, y: u32, rgb: [u8; 3]) {
    let px = canvas.frame().get_pixel(x, y);
    for c in 0..3 {
        assert!(
            (i32::from(px[c]) - i32::from(rgb[c])).abs() <= 8,
            "pixel ({x},{y}) = {px:?}, expected {rgb:?}"
        );
    }
}

#[test]
fn wide_image_fills_width_and_is_centered_vertically() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "wide.png", 1000, 500, RED);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();

    // scaled to 800x400 at y = 100
    let canvas = f.player.surface();
    assert_eq!(canvas.presented(), 1);
    assert_color(canvas, 400, 50, BLUE);
    assert_color(canvas, 400, 101, RED);
    assert_color(canvas, 0, 300, RED);
    assert_color(canvas, 799, 498, RED);
    assert_color(canvas, 400, 550, BLUE);

    // the cache still holds the unscaled decode
    let cached = f.player.cache().peek(&path).unwrap();
    assert_eq!(cached.dimensions(), (1000, 500));
}

#[test]
fn tall_image_fills_height_and_is_centered_horizontally() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "tall.png", 400, 800, GREEN);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();

    // scaled to 300x600 at x = 250
    let canvas = f.player.surface();
    assert_color(canvas, 100, 300, BLUE);
    assert_color(canvas, 251, 0, GREEN);
    assert_color(canvas, 400, 300, GREEN);
    assert_color(canvas, 548, 599, GREEN);
    assert_color(canvas, 600, 300, BLUE);
}

#[test]
fn matching_aspect_fills_the_screen() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "same.png", 40, 30, RED);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();
    let canvas = f.player.surface();
    assert_color(canvas, 0, 0, RED);
    assert_color(canvas, 799, 599, RED);
}

#[test]
fn sliver_image_still_plays() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "sliver.png", 2000, 1, RED);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();
    assert!(f.player.is_playing());

    // width-bound at 800x1, centered on row 299
    let canvas = f.player.surface();
    assert_eq!(canvas.presented(), 1);
    assert_color(canvas, 400, 299, RED);
    assert_color(canvas, 400, 298, BLUE);
    assert_color(canvas, 400, 300, BLUE);

    let path = write_png(f.dir.path(), "pillar.png", 1, 2000, GREEN);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();
    assert!(f.player.is_playing());
    assert_color(f.player.surface(), 399, 300, GREEN);
    assert_color(f.player.surface(), 398, 300, BLUE);
}

/// Solid blue screen with a 100x100 white bitmap centered at (350, 250).
fn unscaled_fixture_with_background_image() -> (Fixture, TempDir) {
    let mut cfg = config(0);
    cfg.image_player.scale = false;
    cfg.image_player.center = false;
    let bg_dir = tempdir().unwrap();
    let bg = write_png(bg_dir.path(), "bg.png", 100, 100, WHITE);
    let background = Background::load(BLUE, Some(bg.as_path()), (800, 600)).unwrap();
    (fixture_with_background(cfg, (800, 600), background), bg_dir)
}

#[test]
fn background_image_is_drawn_under_the_frame() {
    let (mut f, _bg_dir) = unscaled_fixture_with_background_image();
    let path = write_png(f.dir.path(), "small.png", 10, 10, RED);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();

    let canvas = f.player.surface();
    assert_eq!(canvas.presented(), 1);
    assert_color(canvas, 0, 0, RED);
    assert_color(canvas, 349, 300, BLUE);
    assert_color(canvas, 350, 250, WHITE);
    assert_color(canvas, 449, 349, WHITE);
    assert_color(canvas, 450, 350, BLUE);
}

#[test]
fn stop_redraws_the_background_image() {
    let (mut f, _bg_dir) = unscaled_fixture_with_background_image();
    let path = write_png(f.dir.path(), "small.png", 10, 10, RED);
    f.player.play(&ImageDescriptor::new(&path), Some(-1)).unwrap();
    f.player.stop(Duration::ZERO);

    let canvas = f.player.surface();
    assert_eq!(canvas.presented(), 2);
    assert_color(canvas, 0, 0, BLUE);
    assert_color(canvas, 400, 300, WHITE);
    assert_color(canvas, 700, 500, BLUE);
}

#[test]
fn repeats_of_zero_still_show_for_one_loop() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "a.png", 8, 6, RED);
    f.player
        .play(&ImageDescriptor::new(&path).with_repeats(0), None)
        .unwrap();
    assert_eq!(f.player.timer().loop_count(), 1);
    assert!(f.player.is_playing());
    f.clock.advance(Duration::from_millis(4_999));
    assert!(f.player.is_playing());
    f.clock.advance(Duration::from_millis(1));
    assert!(!f.player.is_playing());
}

#[test]
fn explicit_loop_overrides_repeats() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "a.png", 8, 6, RED);
    f.player
        .play(&ImageDescriptor::new(&path).with_repeats(5), Some(2))
        .unwrap();
    f.clock.advance(Duration::from_secs(9));
    assert!(f.player.is_playing());
    f.clock.advance(Duration::from_secs(1));
    assert!(!f.player.is_playing());
}

#[test]
fn infinite_loop_plays_until_stopped() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "a.png", 8, 6, RED);
    f.player.play(&ImageDescriptor::new(&path), Some(-1)).unwrap();
    f.clock.advance(Duration::from_secs(60 * 60 * 24));
    assert!(f.player.is_playing());

    f.player.stop(Duration::ZERO);
    assert!(!f.player.is_playing());
    assert_eq!(f.player.surface().presented(), 2);
    assert_color(f.player.surface(), 400, 300, BLUE);
}

#[test]
fn stop_expires_finite_playback_immediately() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "a.png", 8, 6, RED);
    f.player.play(&ImageDescriptor::new(&path), Some(3)).unwrap();
    assert!(f.player.is_playing());
    f.player.stop(Duration::from_secs(10));
    assert!(!f.player.is_playing());
}

#[test]
fn wait_time_blanks_screen_once_on_expiry() {
    let mut f = fixture(2);
    let path = write_png(f.dir.path(), "a.png", 8, 6, RED);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();
    assert_color(f.player.surface(), 400, 300, RED);

    f.clock.advance(Duration::from_secs(5));
    assert!(!f.player.is_playing());
    assert_eq!(f.player.surface().presented(), 2);
    assert_color(f.player.surface(), 400, 300, BLUE);

    assert!(!f.player.is_playing());
    assert_eq!(f.player.surface().presented(), 2);
}

#[test]
fn no_wait_time_keeps_last_frame() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "a.png", 8, 6, RED);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();
    f.clock.advance(Duration::from_secs(5));
    assert!(!f.player.is_playing());
    assert_eq!(f.player.surface().presented(), 1);
    assert_color(f.player.surface(), 400, 300, RED);
}

#[test]
fn empty_or_missing_path_draws_nothing_but_times_out() {
    let mut f = fixture(0);
    f.player.play(&ImageDescriptor::new(""), None).unwrap();
    f.player
        .play(&ImageDescriptor::new(f.dir.path().join("gone.png")), None)
        .unwrap();
    assert_eq!(f.player.surface().presented(), 0);
    assert_eq!(f.calls.get(), 0);
    assert!(f.player.is_playing());
    f.clock.advance(Duration::from_secs(5));
    assert!(!f.player.is_playing());
}

#[test]
fn corrupt_image_is_reported_and_player_idles() {
    let mut f = fixture(0);
    let path = f.dir.path().join("bad.png");
    std::fs::write(&path, b"not an image").unwrap();
    let err = f
        .player
        .play(&ImageDescriptor::new(&path), None)
        .unwrap_err();
    assert!(matches!(err, PlayerError::Decode(DecodeError::Decode { .. })));
    assert!(!f.player.is_playing());
    assert!(f.player.cache().is_empty());
}

#[test]
fn replaying_an_image_decodes_it_once() {
    let mut f = fixture(0);
    let path = write_png(f.dir.path(), "a.png", 8, 6, RED);
    for _ in 0..4 {
        f.player.play(&ImageDescriptor::new(&path), None).unwrap();
    }
    assert_eq!(f.calls.get(), 1);
    assert_eq!(f.player.cache().len(), 1);
    assert_eq!(f.player.surface().presented(), 4);
}

#[test]
fn cache_budget_evicts_least_recently_shown() {
    // 1 MB budget; 400x400 RGBA is 640_000 bytes so only one fits
    let mut cfg = config(0);
    cfg.image_player.cache_size_limit = 1;
    let mut f = fixture_with(cfg, (800, 600));
    let a = write_png(f.dir.path(), "a.png", 400, 400, RED);
    let b = write_png(f.dir.path(), "b.png", 400, 400, GREEN);

    f.player.play(&ImageDescriptor::new(&a), None).unwrap();
    f.player.play(&ImageDescriptor::new(&b), None).unwrap();
    let cache = f.player.cache();
    assert!(!cache.contains(&a));
    assert!(cache.contains(&b));
    assert_eq!(cache.current_size_bytes(), 640_000);
    assert!(cache.current_size_bytes() <= cache.capacity_bytes());

    f.player.play(&ImageDescriptor::new(&a), None).unwrap();
    assert_eq!(f.calls.get(), 3);
}

#[test]
fn unscaled_image_is_drawn_at_native_size() {
    let mut cfg = config(0);
    cfg.image_player.scale = false;
    cfg.image_player.center = false;
    let mut f = fixture_with(cfg, (800, 600));
    let path = write_png(f.dir.path(), "small.png", 10, 10, RED);
    f.player.play(&ImageDescriptor::new(&path), None).unwrap();
    assert_color(f.player.surface(), 0, 0, RED);
    assert_color(f.player.surface(), 9, 9, RED);
    assert_color(f.player.surface(), 10, 10, BLUE);
}

#[test]
fn factory_builds_a_working_player() {
    let dir = tempdir().unwrap();
    let path = write_png(dir.path(), "a.jpg.png", 16, 9, RED);
    let cfg = config(0);
    let mut player = create_player(&cfg, Canvas::new(32, 18), Background::solid(BLUE));
    player.play(&ImageDescriptor::new(&path), None).unwrap();
    assert!(player.is_playing());
    assert!(ImagePlayer::<Canvas>::can_loop_count());
    let canvas = player.into_surface();
    assert_color(&canvas, 16, 9, RED);
}
