//! Still-image player: draws one image per `play` and reports whether it is
//! still on screen when polled.

pub mod timer;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::error::PlayerError;
use crate::playlist::ImageDescriptor;
use crate::render::cache::ImageCache;
use crate::render::compositor::{Background, Compositor};
use crate::render::loader::{Decoder, ImageDecoder};
use crate::render::surface::Surface;
use timer::{Clock, MonotonicClock, PlaybackTimer, TimerStatus, resolve_loop_count};

/// Player backends a looper can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Image,
    /// External video players; they repeat whole playlists rather than single items.
    Video,
}

impl PlayerKind {
    /// Whether the backend honours per-item repeat counts.
    pub const fn can_loop_count(self) -> bool {
        matches!(self, Self::Image)
    }
}

pub struct ImagePlayer<S, D = ImageDecoder, C = MonotonicClock>
where
    S: Surface,
    D: Decoder,
    C: Clock,
{
    surface: S,
    cache: ImageCache<D>,
    compositor: Compositor,
    background: Background,
    timer: PlaybackTimer<C>,
    wait_time: Duration,
}

/// Build an image player from configuration with the stock decoder and clock.
pub fn create_player<S: Surface>(
    config: &Configuration,
    screen: S,
    background: Background,
) -> ImagePlayer<S> {
    let decoder = ImageDecoder::with_extensions(&config.image_player.extensions);
    ImagePlayer::with_parts(config, screen, background, decoder, MonotonicClock)
}

impl<S: Surface> ImagePlayer<S> {
    pub const KIND: PlayerKind = PlayerKind::Image;

    pub const fn can_loop_count() -> bool {
        Self::KIND.can_loop_count()
    }
}

impl<S, D, C> ImagePlayer<S, D, C>
where
    S: Surface,
    D: Decoder,
    C: Clock,
{
    pub fn with_parts(
        config: &Configuration,
        surface: S,
        background: Background,
        decoder: D,
        clock: C,
    ) -> Self {
        let opts = &config.image_player;
        let (width, height) = surface.size();
        info!(
            width,
            height,
            cache_bytes = opts.cache_size_limit_bytes(),
            duration_secs = opts.duration,
            scale = opts.scale,
            center = opts.center,
            "image player ready"
        );
        Self {
            surface,
            cache: ImageCache::new(decoder, opts.cache_size_limit_bytes()),
            compositor: Compositor::new(opts.scale, opts.center),
            background,
            timer: PlaybackTimer::new(clock, opts.duration()),
            wait_time: config.looper.wait_time(),
        }
    }

    /// Show `image` for `loop_count` loops (or its own repeat count).
    ///
    /// A missing or empty file still starts the timer over whatever is on
    /// screen.
    ///
    /// # Errors
    /// Decoding, resizing or presenting failed; the player is left idle.
    pub fn play(
        &mut self,
        image: &ImageDescriptor,
        loop_count: Option<i64>,
    ) -> Result<(), PlayerError> {
        let loops = resolve_loop_count(loop_count, image.repeats);
        if let Err(err) =
            self.compositor
                .render(image, &mut self.cache, &mut self.surface, &self.background)
        {
            self.timer.stop();
            return Err(err);
        }
        debug!(path = %image.filename.display(), loops, "playing image");
        self.timer.start(loops);
        Ok(())
    }

    /// Whether the current image is still due on screen.
    ///
    /// When the time runs out and a wait between images is configured, the
    /// screen is cleared to the background so the gap shows no stale frame.
    pub fn is_playing(&mut self) -> bool {
        match self.timer.poll() {
            TimerStatus::Playing => true,
            TimerStatus::Idle => false,
            TimerStatus::Expired => {
                if !self.wait_time.is_zero() {
                    self.blank();
                }
                false
            }
        }
    }

    /// End the current image now.
    ///
    /// `block_timeout` exists for parity with threaded backends; nothing
    /// here runs in the background.
    pub fn stop(&mut self, block_timeout: Duration) {
        debug!(?block_timeout, "stopping image");
        self.blank();
        self.timer.stop();
    }

    fn blank(&mut self) {
        if let Err(err) = self
            .compositor
            .blank(&mut self.surface, &self.background, true)
        {
            warn!("failed to present background: {err:#}");
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn cache(&self) -> &ImageCache<D> {
        &self.cache
    }

    pub fn timer(&self) -> &PlaybackTimer<C> {
        &self.timer
    }

    pub fn into_surface(mut self) -> S {
        self.cache.clear();
        self.surface
    }
}
